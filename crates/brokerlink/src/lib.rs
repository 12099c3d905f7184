//! Umbrella crate for the brokerlink client stack.
//!
//! Re-exports the three layers so applications can depend on one crate:
//! [`frame`] for the wire codec, [`session`] for authenticated
//! connections, [`pool`] for bounded session sharing.
//!
//! ```no_run
//! use brokerlink::{BrokerConfig, ParameterValue, Session};
//! # struct SiteCipher;
//! # impl brokerlink::Cipher for SiteCipher {
//! #     fn encode(&self, p: &[u8]) -> Vec<u8> { p.to_vec() }
//! #     fn decode(&self, c: &[u8]) -> Vec<u8> { c.to_vec() }
//! # }
//!
//! let config = BrokerConfig::from_json_file("broker.json")?;
//! let mut session = Session::connect(config, &SiteCipher)?;
//! let reply = session.invoke("XWB EGCHO STRING", &[ParameterValue::literal("hello")])?;
//! println!("{reply}");
//! # Ok::<(), brokerlink::SessionError>(())
//! ```

pub use brokerlink_frame as frame;
pub use brokerlink_pool as pool;
pub use brokerlink_session as session;

pub use brokerlink_frame::{FrameConfig, ParameterValue};
pub use brokerlink_pool::{PoolError, PooledSession, SessionPool};
pub use brokerlink_session::{BrokerConfig, Cipher, Session, SessionError, SessionState};
