use std::fmt;
use std::net::{Shutdown, TcpStream};

use brokerlink_frame::{ParameterValue, ReplyReader, RequestKind, RequestWriter, SIGN_OFF};
use tracing::{debug, info};

use crate::cipher::Cipher;
use crate::config::BrokerConfig;
use crate::error::{Result, SessionError};
use crate::handshake;
use crate::transport;

/// Lifecycle of one session.
///
/// `Ready` is the only state accepting invocations. A transport or
/// protocol failure moves the session to `Faulted` permanently; there is
/// no in-place recovery, callers reconnect instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Ready,
    Faulted,
    Closed,
}

/// One authenticated connection to a broker server.
///
/// Owns the TCP stream exclusively and enforces the strict one request,
/// one reply discipline: `invoke` never overlaps and replies can never be
/// attributed to the wrong call.
pub struct Session {
    reader: ReplyReader<TcpStream>,
    writer: RequestWriter<TcpStream>,
    state: SessionState,
    user_id: String,
    config: BrokerConfig,
}

impl Session {
    /// Connect and run the full handshake: sign-on, application context,
    /// credential validation. On success the session is `Ready` and the
    /// server-assigned user id is available via [`Session::user_id`].
    pub fn connect(config: BrokerConfig, cipher: &dyn Cipher) -> Result<Self> {
        config.validate()?;

        let stream = transport::connect(&config)?;
        let local_addr = stream
            .local_addr()
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|_| "0.0.0.0".to_string());

        let write_half = stream.try_clone().map_err(|source| SessionError::Connect {
            host: config.host.clone(),
            port: config.port,
            source,
        })?;
        let mut reader = ReplyReader::with_config(stream, config.frame_config());
        let mut writer = RequestWriter::with_config(write_half, config.frame_config());

        let user_id = handshake::run(&mut reader, &mut writer, &config, cipher, &local_addr)?;

        info!(
            host = %config.host,
            port = config.port,
            user_id = %user_id,
            "session established"
        );

        Ok(Self {
            reader,
            writer,
            state: SessionState::Ready,
            user_id,
            config,
        })
    }

    /// Invoke a remote procedure and block for its reply.
    ///
    /// Parameters bind strictly by position. An encoding failure is raised
    /// before any byte is written and leaves the session `Ready`; any
    /// failure after the request starts moving faults the session.
    pub fn invoke(&mut self, name: &str, params: &[ParameterValue]) -> Result<String> {
        if self.state != SessionState::Ready {
            return Err(SessionError::NotReady { state: self.state });
        }

        match handshake::exchange(
            &mut self.reader,
            &mut self.writer,
            &self.config,
            name,
            RequestKind::Procedure,
            params,
        ) {
            Ok(reply) => Ok(reply),
            Err(err @ SessionError::Encode(_)) => Err(err),
            Err(err) => {
                debug!(procedure = name, error = %err, "invoke failed; session faulted");
                self.state = SessionState::Faulted;
                Err(err)
            }
        }
    }

    /// Sign off and close the connection. Idempotent; the sign-off token is
    /// best effort and failures on an already-broken stream are ignored.
    pub fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        if self.state == SessionState::Ready {
            let _ = self.writer.write_request(SIGN_OFF);
        }
        let _ = self.writer.get_ref().shutdown(Shutdown::Both);
        self.state = SessionState::Closed;
        debug!(host = %self.config.host, "session closed");
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the session accepts invocations.
    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Ready
    }

    /// Server-assigned user id from credential validation.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The profile this session was built from.
    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

// The config's own Debug impl redacts the credential fields.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("user_id", &self.user_id)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
