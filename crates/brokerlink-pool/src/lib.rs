//! Bounded pooling of authenticated broker sessions.
//!
//! The handshake is expensive (four round trips plus credential
//! validation), so callers that issue many invocations share a
//! [`SessionPool`]. The pool hands out exclusive leases; a session is
//! never visible to two callers at once, preserving the protocol's strict
//! request/reply discipline.

pub mod error;
pub mod pool;

pub use error::{PoolError, Result};
pub use pool::{PooledSession, SessionPool};
