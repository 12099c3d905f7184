use std::io::{ErrorKind, Write};
use std::time::Instant;

use crate::codec::FrameConfig;
use crate::error::{FrameError, Result};

/// Writes fully assembled request frames to any `Write` stream.
///
/// A request is always written in one logical operation before the caller
/// may read; partial writes, `Interrupted` and `WouldBlock` are retried
/// here, not by the caller. Request assembly itself lives in
/// [`crate::codec`] and [`crate::params`] so encoding failures surface
/// before any byte reaches the stream.
pub struct RequestWriter<T> {
    inner: T,
    config: FrameConfig,
}

impl<T: Write> RequestWriter<T> {
    /// Create a request writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a request writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self { inner, config }
    }

    /// Write one assembled request (blocking), retrying partial writes.
    ///
    /// `FrameConfig::write_timeout` bounds the whole request: a stream
    /// that keeps refusing bytes fails once the deadline passes instead
    /// of retrying forever.
    pub fn write_request(&mut self, request: &[u8]) -> Result<()> {
        let deadline = self.config.write_timeout.map(|t| Instant::now() + t);
        let mut offset = 0usize;
        while offset < request.len() {
            match self.inner.write(&request[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    check_deadline(deadline)?;
                    continue;
                }
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        let deadline = self.config.write_timeout.map(|t| Instant::now() + t);
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    check_deadline(deadline)?;
                    continue;
                }
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

fn check_deadline(deadline: Option<Instant>) -> Result<()> {
    match deadline {
        Some(deadline) if Instant::now() >= deadline => Err(FrameError::Io(std::io::Error::new(
            ErrorKind::TimedOut,
            "request not written before the write deadline",
        ))),
        _ => Ok(()),
    }
}
