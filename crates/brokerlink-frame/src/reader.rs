use std::io::{ErrorKind, Read};
use std::time::Instant;

use bytes::{Bytes, BytesMut};
use tracing::trace;

use crate::codec::{decode_reply, FrameConfig};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete sentinel-terminated replies from any `Read` stream.
///
/// TCP hands back arbitrary fragments; the reader accumulates them and
/// scans for the end mark, so callers always get whole replies. Bytes
/// after an end mark are retained for the next call (the protocol is
/// strictly one reply per request, but surplus is buffered rather than
/// discarded).
pub struct ReplyReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Read> ReplyReader<T> {
    /// Create a reply reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a reply reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Read the next complete reply (blocking).
    ///
    /// `FrameConfig::read_timeout` bounds the whole reply, not individual
    /// reads: a peer dripping bytes slower than the deadline still fails
    /// once the deadline passes without a complete reply. Returns
    /// `Err(FrameError::ConnectionClosed)` when EOF is reached mid-reply.
    /// Read timeouts on the underlying stream surface as `FrameError::Io`
    /// with `TimedOut`/`WouldBlock`.
    pub fn read_reply(&mut self) -> Result<Bytes> {
        let deadline = self.config.read_timeout.map(|t| Instant::now() + t);
        loop {
            if let Some(reply) =
                decode_reply(&mut self.buf, self.config.end_mark, self.config.max_reply_size)?
            {
                return Ok(reply);
            }

            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return Err(FrameError::Io(std::io::Error::new(
                        ErrorKind::TimedOut,
                        "no complete reply before the read deadline",
                    )));
                }
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            trace!(read, buffered = self.buf.len() + read, "accumulated reply bytes");
            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Bytes buffered beyond the last returned reply.
    pub fn surplus(&self) -> usize {
        self.buf.len()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::time::Duration;

    use super::*;

    #[test]
    fn read_single_reply() {
        let mut reader = ReplyReader::new(Cursor::new(b"hello\x04".to_vec()));
        let reply = reader.read_reply().unwrap();
        assert_eq!(reply.as_ref(), b"hello");
    }

    #[test]
    fn read_multiple_replies() {
        let mut reader = ReplyReader::new(Cursor::new(b"one\x04two\x04three\x04".to_vec()));
        assert_eq!(reader.read_reply().unwrap().as_ref(), b"one");
        assert_eq!(reader.read_reply().unwrap().as_ref(), b"two");
        assert_eq!(reader.read_reply().unwrap().as_ref(), b"three");
    }

    #[test]
    fn byte_by_byte_fragmentation() {
        let wire = b"fragmented reply payload\x04".to_vec();
        let mut reader = ReplyReader::new(ByteByByteReader { bytes: wire, pos: 0 });
        let reply = reader.read_reply().unwrap();
        assert_eq!(reply.as_ref(), b"fragmented reply payload");
    }

    #[test]
    fn identical_reply_for_any_split() {
        // The same logical reply split at every possible point must decode
        // identically regardless of where TCP fragments it.
        let wire = b"\x00\x00OK^A^B~C\x04".to_vec();
        for split in 1..wire.len() {
            let reader = TwoPartReader {
                parts: vec![wire[..split].to_vec(), wire[split..].to_vec()],
                next: 0,
            };
            let mut framed = ReplyReader::new(reader);
            let reply = framed.read_reply().unwrap();
            assert_eq!(reply.as_ref(), b"OK^A^B~C", "split at {split}");
        }
    }

    #[test]
    fn connection_closed_at_eof() {
        let mut reader = ReplyReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_reply().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn connection_closed_mid_reply() {
        let mut reader = ReplyReader::new(Cursor::new(b"no end mark here".to_vec()));
        let err = reader.read_reply().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn surplus_survives_between_reads() {
        let mut reader = ReplyReader::new(Cursor::new(b"first\x04second\x04".to_vec()));
        let first = reader.read_reply().unwrap();
        assert_eq!(first.as_ref(), b"first");
        // The whole wire arrived in one read; the tail must be buffered.
        assert_eq!(reader.surplus(), b"second\x04".len());
        let second = reader.read_reply().unwrap();
        assert_eq!(second.as_ref(), b"second");
        assert_eq!(reader.surplus(), 0);
    }

    #[test]
    fn oversized_reply_rejected() {
        let cfg = FrameConfig {
            max_reply_size: 8,
            ..FrameConfig::default()
        };
        let mut reader = ReplyReader::with_config(Cursor::new(vec![b'x'; 64]), cfg);
        let err = reader.read_reply().unwrap_err();
        assert!(matches!(err, FrameError::ReplyTooLarge { .. }));
    }

    #[test]
    fn slow_drip_misses_the_reply_deadline() {
        // Each read delivers a byte within the socket's own timeout, so
        // only the whole-reply deadline can stop this.
        let cfg = FrameConfig {
            read_timeout: Some(Duration::from_millis(120)),
            ..FrameConfig::default()
        };
        let drip = DripReader {
            bytes: b"\x00\x00slowdrip\x04".to_vec(),
            pos: 0,
            delay: Duration::from_millis(50),
        };
        let mut reader = ReplyReader::with_config(drip, cfg);
        let err = reader.read_reply().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::TimedOut));
    }

    #[test]
    fn deadline_ignores_already_buffered_replies() {
        let cfg = FrameConfig {
            read_timeout: Some(Duration::from_millis(100)),
            ..FrameConfig::default()
        };
        let mut reader = ReplyReader::with_config(Cursor::new(b"one\x04two\x04".to_vec()), cfg);
        assert_eq!(reader.read_reply().unwrap().as_ref(), b"one");
        std::thread::sleep(Duration::from_millis(120));
        // The second reply is fully buffered; the fresh deadline applies
        // per call, not per connection.
        assert_eq!(reader.read_reply().unwrap().as_ref(), b"two");
    }

    #[test]
    fn timed_out_read_propagates_io_error() {
        let mut reader = ReplyReader::new(AlwaysTimedOut);
        let err = reader.read_reply().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::TimedOut));
    }

    #[test]
    fn interrupted_read_retries() {
        let reader = InterruptedThenData {
            interrupted: false,
            bytes: b"ok\x04".to_vec(),
            pos: 0,
        };
        let mut framed = ReplyReader::new(reader);
        assert_eq!(framed.read_reply().unwrap().as_ref(), b"ok");
    }

    #[test]
    fn custom_end_mark_honored() {
        let cfg = FrameConfig {
            end_mark: 0xFF,
            ..FrameConfig::default()
        };
        let mut reader = ReplyReader::with_config(Cursor::new(b"data\x04more\xff".to_vec()), cfg);
        // 0x04 is ordinary payload under this configuration.
        assert_eq!(reader.read_reply().unwrap().as_ref(), b"data\x04more");
    }

    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct TwoPartReader {
        parts: Vec<Vec<u8>>,
        next: usize,
    }

    impl Read for TwoPartReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.next >= self.parts.len() {
                return Ok(0);
            }
            let part = &self.parts[self.next];
            self.next += 1;
            buf[..part.len()].copy_from_slice(part);
            Ok(part.len())
        }
    }

    struct DripReader {
        bytes: Vec<u8>,
        pos: usize,
        delay: Duration,
    }

    impl Read for DripReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            std::thread::sleep(self.delay);
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct AlwaysTimedOut;

    impl Read for AlwaysTimedOut {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::TimedOut))
        }
    }

    struct InterruptedThenData {
        interrupted: bool,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            if self.pos >= self.bytes.len() {
                return Ok(0);
            }
            let n = (self.bytes.len() - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }
}
