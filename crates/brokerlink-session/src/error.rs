use std::time::Duration;

use brokerlink_frame::{EncodeError, FrameError};

use crate::session::SessionState;

/// Errors surfaced by session construction and invocation.
///
/// Server-supplied reason text is carried verbatim; this layer never
/// paraphrases it. Credential rejection (`Auth`) is deliberately distinct
/// from a malformed handshake reply (`Protocol`): the first means wrong
/// password, the second a broken session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level connect failure. Retryable by the caller.
    #[error("connect to {host}:{port} failed: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// The server rejected the access/verify pair.
    #[error("credentials rejected: {0}")]
    Auth(String),

    /// The server rejected the application context.
    #[error("application context rejected: {0}")]
    ContextRejected(String),

    /// The byte stream violated the protocol's required shape. The owning
    /// session is always discarded.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// No complete reply arrived within the deadline. The session may have
    /// a partial frame in flight and is discarded.
    #[error("no reply within {0:?}")]
    Timeout(Duration),

    /// The caller supplied an invalid parameter. Raised before any I/O;
    /// the session stays usable.
    #[error("parameter encoding failed: {0}")]
    Encode(#[from] EncodeError),

    /// Framing-level transport failure.
    #[error("frame error: {0}")]
    Frame(FrameError),

    /// The session or cipher configuration is unusable.
    #[error("configuration error: {0}")]
    Config(String),

    /// The session is not in the `Ready` state.
    #[error("session is {state:?}; operation requires Ready")]
    NotReady { state: SessionState },
}

impl SessionError {
    /// Classify a read-path frame error. Timeouts on the socket surface as
    /// `TimedOut` or `WouldBlock` depending on the platform; both mean the
    /// reply deadline elapsed.
    pub(crate) fn from_read_error(err: FrameError, deadline: Duration) -> Self {
        match err {
            FrameError::Io(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
                ) =>
            {
                SessionError::Timeout(deadline)
            }
            err @ (FrameError::TruncatedHeader { .. } | FrameError::ReplyTooLarge { .. }) => {
                SessionError::Protocol(err.to_string())
            }
            other => SessionError::Frame(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
