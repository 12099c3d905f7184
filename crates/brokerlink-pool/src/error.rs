use std::time::Duration;

use brokerlink_session::SessionError;

/// Errors surfaced by pool checkout and shutdown.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// Every session stayed leased for the whole wait.
    #[error("no session available within {0:?}")]
    Exhausted(Duration),

    /// The pool was shut down; no further leases are granted.
    #[error("pool is shut down")]
    Closed,

    /// Building a replacement session failed.
    #[error(transparent)]
    Session(#[from] SessionError),
}

pub type Result<T> = std::result::Result<T, PoolError>;
