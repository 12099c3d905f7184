//! Authenticated sessions over the broker RPC protocol.
//!
//! A [`Session`] owns one TCP connection, drives the multi-step sign-on /
//! context / authentication handshake and then exposes a strictly
//! request/reply [`Session::invoke`]. Credential obfuscation is supplied
//! through the pluggable [`Cipher`] trait; the algorithm itself is
//! site-secret and never part of this crate.

pub mod cipher;
pub mod config;
pub mod error;
pub mod handshake;
pub mod session;
mod transport;

pub use brokerlink_frame::ParameterValue;
pub use cipher::Cipher;
pub use config::BrokerConfig;
pub use error::{Result, SessionError};
pub use session::{Session, SessionState};
