/// Errors that can occur while framing requests and delimiting replies.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The reply's two-byte security/application header was cut off by the
    /// end mark. There is no safe way to resynchronize the stream.
    #[error("truncated reply header ({len} bytes before end mark)")]
    TruncatedHeader { len: usize },

    /// The accumulated reply exceeds the configured maximum size without an
    /// end mark in sight.
    #[error("reply too large ({size} bytes buffered, max {max})")]
    ReplyTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete reply was received.
    #[error("connection closed (incomplete reply)")]
    ConnectionClosed,
}

/// Errors raised while encoding a request, before any I/O occurs.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// Procedure names are count-prefixed with a single byte on the wire.
    #[error("procedure name too long ({len} bytes, max {max})")]
    NameTooLong { len: usize, max: usize },

    /// A procedure name must be non-empty.
    #[error("procedure name is empty")]
    EmptyName,

    /// A by-reference parameter must name server-side storage.
    #[error("reference parameter has an empty name")]
    EmptyReference,

    /// A literal, reference or list item wider than the three-digit length
    /// field can carry.
    #[error("parameter item too long ({len} bytes, max {max})")]
    ItemTooLong { len: usize, max: usize },

    /// The list count prefix is three digits wide.
    #[error("list has too many items ({count}, max {max})")]
    TooManyItems { count: usize, max: usize },

    /// Word-processing lines are rejected rather than silently truncated.
    #[error("word-processing line {index} too long ({len} bytes, max {max})")]
    LineTooLong {
        index: usize,
        len: usize,
        max: usize,
    },
}

pub type Result<T> = std::result::Result<T, FrameError>;
