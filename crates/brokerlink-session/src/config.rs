use std::fmt;
use std::path::Path;
use std::time::Duration;

use brokerlink_frame::{FrameConfig, DEFAULT_END_MARK, DEFAULT_MAX_REPLY};
use serde::Deserialize;

use crate::error::{Result, SessionError};

/// Connection profile for one broker server.
///
/// Loadable from a JSON profile file; durations are expressed in
/// milliseconds there. The end mark and handshake payloads are site and
/// protocol-version specific, so they are configuration rather than
/// constants.
#[derive(Clone, Deserialize)]
pub struct BrokerConfig {
    /// Server hostname or address.
    pub host: String,
    /// Server listener port.
    pub port: u16,
    /// Application context selecting the permission/menu scope.
    pub context: String,
    /// Access code. Redacted from debug output.
    pub access: String,
    /// Verify code. Redacted from debug output.
    pub verify: String,
    /// Client name reported during sign-on.
    #[serde(default = "default_client_name")]
    pub client_name: String,
    /// TCP connect deadline in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Per-invoke reply deadline in milliseconds.
    #[serde(default = "default_reply_timeout_ms")]
    pub reply_timeout_ms: u64,
    /// Byte terminating every request and reply.
    #[serde(default = "default_end_mark")]
    pub end_mark: u8,
    /// Maximum buffered reply size in bytes.
    #[serde(default = "default_max_reply_size")]
    pub max_reply_size: usize,
    /// Word-processing chunk size in lines.
    #[serde(default = "default_max_lines_per_chunk")]
    pub max_lines_per_chunk: usize,
    /// Maximum live sessions in a pool built from this profile.
    #[serde(default = "default_pool_capacity")]
    pub pool_capacity: usize,
}

fn default_client_name() -> String {
    "BROKERLINK".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_reply_timeout_ms() -> u64 {
    30_000
}

fn default_end_mark() -> u8 {
    DEFAULT_END_MARK
}

fn default_max_reply_size() -> usize {
    DEFAULT_MAX_REPLY
}

fn default_max_lines_per_chunk() -> usize {
    brokerlink_frame::DEFAULT_MAX_LINES_PER_CHUNK
}

fn default_pool_capacity() -> usize {
    4
}

impl BrokerConfig {
    /// Load a profile from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: BrokerConfig = serde_json::from_str(json)
            .map_err(|err| SessionError::Config(format!("invalid broker profile: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a profile from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|err| {
            SessionError::Config(format!("cannot read profile {}: {err}", path.display()))
        })?;
        Self::from_json(&json)
    }

    /// Reject profiles that cannot produce a working handshake.
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(SessionError::Config("host is empty".into()));
        }
        if self.context.is_empty() {
            return Err(SessionError::Config("application context is empty".into()));
        }
        if self.access.is_empty() || self.verify.is_empty() {
            return Err(SessionError::Config(
                "access and verify codes are required".into(),
            ));
        }
        if self.pool_capacity == 0 {
            return Err(SessionError::Config("pool capacity must be at least 1".into()));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }

    /// Framing configuration derived from this profile.
    pub fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            end_mark: self.end_mark,
            max_reply_size: self.max_reply_size,
            read_timeout: Some(self.reply_timeout()),
            write_timeout: Some(self.reply_timeout()),
        }
    }
}

impl fmt::Debug for BrokerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("context", &self.context)
            .field("access", &format_args!("<redacted:{} bytes>", self.access.len()))
            .field("verify", &format_args!("<redacted:{} bytes>", self.verify.len()))
            .field("client_name", &self.client_name)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("reply_timeout_ms", &self.reply_timeout_ms)
            .field("end_mark", &self.end_mark)
            .field("max_reply_size", &self.max_reply_size)
            .field("max_lines_per_chunk", &self.max_lines_per_chunk)
            .field("pool_capacity", &self.pool_capacity)
            .finish()
    }
}
