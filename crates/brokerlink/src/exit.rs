use std::fmt;
use std::io;

use brokerlink_pool::PoolError;
use brokerlink_session::SessionError;

// Exit code constants follow the sysexits-style map used across our tools.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const PROTOCOL_ERROR: i32 = 3;
pub const ACCESS_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => ACCESS_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn session_error(context: &str, err: SessionError) -> CliError {
    match err {
        SessionError::Connect { source, .. } => io_error(context, source),
        SessionError::Auth(_) | SessionError::ContextRejected(_) => {
            CliError::new(ACCESS_DENIED, format!("{context}: {err}"))
        }
        SessionError::Timeout(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        SessionError::Encode(_) => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        SessionError::Config(_) => CliError::new(USAGE, format!("{context}: {err}")),
        SessionError::Protocol(_) | SessionError::Frame(_) => {
            CliError::new(PROTOCOL_ERROR, format!("{context}: {err}"))
        }
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn pool_error(context: &str, err: PoolError) -> CliError {
    match err {
        PoolError::Session(err) => session_error(context, err),
        PoolError::Exhausted(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        PoolError::Closed => CliError::new(INTERNAL, format!("{context}: {err}")),
    }
}
