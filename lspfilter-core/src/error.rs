//! Error types for frame parsing and filter policy construction.
//!
//! `FramingError` covers every way a `Content-Length` framed stream can be
//! corrupt or cut short. None of them is recoverable: a length-prefixed stream
//! has no resynchronisation point, so callers abort instead of guessing.
//!
//! `PolicyError` covers invalid filter configuration and is raised before any
//! subprocess is started.

/// Errors that can occur while reading a `Content-Length` framed message.
#[derive(Debug, thiserror::Error)]
pub enum FramingError {
    /// A header line is not of the form `Name: value`.
    #[error("Malformed header line: {line:?}")]
    MalformedHeader {
        /// The offending line, lossily decoded and without its terminator.
        line: String,
    },

    /// The header block ended without a `Content-Length` header.
    #[error("Missing Content-Length header")]
    MissingContentLength,

    /// The `Content-Length` value is not a non-negative decimal integer.
    #[error("Invalid Content-Length value: {value:?}")]
    InvalidContentLength {
        /// The raw header value.
        value: String,
    },

    /// Two `Content-Length` headers disagree.
    #[error("Conflicting Content-Length headers: {first} and {second}")]
    ConflictingContentLength {
        /// The first declared length.
        first: usize,
        /// The later, different declared length.
        second: usize,
    },

    /// The header block grew past the limit without a blank line.
    #[error("Header block exceeds maximum size of {max_bytes} bytes")]
    HeaderTooLarge {
        /// The configured maximum header size in bytes.
        max_bytes: usize,
    },

    /// The declared payload length is larger than the reader accepts.
    #[error("Declared frame length {declared} exceeds maximum of {max_bytes} bytes")]
    FrameTooLarge {
        /// The length declared by the header.
        declared: usize,
        /// The configured maximum frame size in bytes.
        max_bytes: usize,
    },

    /// The stream closed part-way through a header block.
    #[error("Stream closed inside header block after {received} bytes")]
    TruncatedHeader {
        /// Header bytes received before EOF.
        received: usize,
    },

    /// The stream closed before the declared payload was fully read.
    #[error("Stream closed mid-payload: expected {expected} bytes, received {received}")]
    TruncatedPayload {
        /// The length declared by the header.
        expected: usize,
        /// Payload bytes received before EOF.
        received: usize,
    },

    /// An underlying IO error occurred while reading the stream.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while building a [`FilterPolicy`](crate::capability::FilterPolicy).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    /// Both an enable-list and a disable-list were given.
    #[error("both enable/disable flags given")]
    Conflict {
        /// Providers named in the enable-list.
        enable: Vec<String>,
        /// Providers named in the disable-list.
        disable: Vec<String>,
    },
}
