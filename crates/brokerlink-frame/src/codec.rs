use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{EncodeError, FrameError};

/// Protocol header carried by every request.
pub const REQUEST_PREFIX: &[u8] = b"[XWB]1130";

/// Default reply end mark: EOT. Site/version specific, see [`FrameConfig`].
pub const DEFAULT_END_MARK: u8 = 0x04;

/// Default maximum buffered reply size: 4 MiB.
pub const DEFAULT_MAX_REPLY: usize = 4 * 1024 * 1024;

/// Graceful sign-off token sent before closing a connection.
pub const SIGN_OFF: &[u8] = b"#BYE#";

/// Procedure names are count-prefixed with a single byte.
pub const MAX_NAME_LEN: usize = 255;

/// Wire token for a normal procedure invocation.
const PROCEDURE_TOKEN: &[u8] = &[b'2', 0x01, b'1'];

/// Wire token for a broker control command (sign-on, sign-off).
const COMMAND_TOKEN: &[u8] = &[b'4'];

/// Distinguishes broker control commands from normal procedure calls.
///
/// The sign-on exchange identifies the peer as a broker-protocol client;
/// everything after the handshake uses [`RequestKind::Procedure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Procedure,
    Command,
}

impl RequestKind {
    fn token(self) -> &'static [u8] {
        match self {
            RequestKind::Procedure => PROCEDURE_TOKEN,
            RequestKind::Command => COMMAND_TOKEN,
        }
    }
}

/// Encode a complete request frame into `dst`.
///
/// Wire format:
/// ```text
/// ┌───────────────┬─────────────┬─────────────────┬──────────────┬──────────┐
/// │ "[XWB]1130"   │ kind token  │ len(1B) + name  │ param block  │ end mark │
/// └───────────────┴─────────────┴─────────────────┴──────────────┴──────────┘
/// ```
///
/// `params_block` is produced by [`crate::params::encode_params`]; this
/// function only validates the procedure name and assembles the envelope.
pub fn encode_request(
    name: &str,
    kind: RequestKind,
    params_block: &[u8],
    end_mark: u8,
    dst: &mut BytesMut,
) -> std::result::Result<(), EncodeError> {
    if name.is_empty() {
        return Err(EncodeError::EmptyName);
    }
    if name.len() > MAX_NAME_LEN {
        return Err(EncodeError::NameTooLong {
            len: name.len(),
            max: MAX_NAME_LEN,
        });
    }

    dst.reserve(REQUEST_PREFIX.len() + 4 + 1 + name.len() + params_block.len() + 1);
    dst.put_slice(REQUEST_PREFIX);
    dst.put_slice(kind.token());
    dst.put_u8(name.len() as u8);
    dst.put_slice(name.as_bytes());
    dst.put_slice(params_block);
    dst.put_u8(end_mark);
    Ok(())
}

/// Decode a reply from a buffer.
///
/// Scans for the end mark; returns `Ok(None)` while the buffer holds no
/// complete reply yet. On success, consumes the reply and the end mark,
/// leaving any surplus bytes in place for the next call. The reply's
/// two-byte security/application header (present as a leading NUL pair on
/// clean replies) is stripped before the payload is surfaced.
pub fn decode_reply(
    src: &mut BytesMut,
    end_mark: u8,
    max_reply: usize,
) -> crate::error::Result<Option<Bytes>> {
    let Some(pos) = src.iter().position(|&b| b == end_mark) else {
        if src.len() > max_reply {
            return Err(FrameError::ReplyTooLarge {
                size: src.len(),
                max: max_reply,
            });
        }
        return Ok(None); // Need more data
    };

    if pos > max_reply {
        return Err(FrameError::ReplyTooLarge {
            size: pos,
            max: max_reply,
        });
    }

    let mut payload = src.split_to(pos);
    src.advance(1); // end mark

    if payload.first() == Some(&0x00) {
        if payload.len() < 2 {
            return Err(FrameError::TruncatedHeader { len: payload.len() });
        }
        payload.advance(2);
    }

    Ok(Some(payload.freeze()))
}

/// Configuration for framing one connection.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Byte terminating every request and reply.
    pub end_mark: u8,
    /// Maximum buffered reply size in bytes.
    pub max_reply_size: usize,
    /// Deadline for one complete reply, enforced by the reader across
    /// however many reads the reply takes.
    pub read_timeout: Option<std::time::Duration>,
    /// Deadline for one complete request, enforced by the writer's
    /// retry loops.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            end_mark: DEFAULT_END_MARK,
            max_reply_size: DEFAULT_MAX_REPLY,
            read_timeout: None,
            write_timeout: None,
        }
    }
}
