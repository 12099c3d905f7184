//! Sentinel-delimited framing for the broker RPC wire protocol.
//!
//! The protocol is text oriented and has no length prefix: a request is a
//! `[XWB]` header, a command token, a count-prefixed procedure name and a
//! parameter block, terminated by a single end-mark byte; a reply is an
//! opaque payload terminated by the same end mark. This crate turns a
//! fragmenting byte stream into complete replies and turns procedure calls
//! into request bytes. It never interprets reply payloads.
//!
//! The end mark is site/protocol-version specific and therefore lives in
//! [`FrameConfig`] rather than being hard-coded at call sites.

pub mod codec;
pub mod error;
pub mod params;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_reply, encode_request, FrameConfig, RequestKind, DEFAULT_END_MARK, DEFAULT_MAX_REPLY,
    REQUEST_PREFIX, SIGN_OFF,
};
pub use error::{EncodeError, FrameError, Result};
pub use params::{
    chunk_lines, encode_literal_item, encode_params, ParameterValue, DEFAULT_MAX_LINES_PER_CHUNK,
    MAX_ITEM_LEN,
};
pub use reader::ReplyReader;
pub use writer::RequestWriter;
