//! `Content-Length` message framing for language-server streams.
//!
//! A frame on the wire is a block of `Name: value` header lines, a blank line,
//! then exactly `Content-Length` payload bytes:
//!
//! ```text
//! Content-Length: 52\r\n
//! \r\n
//! {"jsonrpc":"2.0","id":1,"result":{"capabilities":{}}}
//! ```
//!
//! Header parsing is a pure function ([`parse_header_block`]) so it can be
//! fuzzed and benchmarked without a runtime. [`FrameReader`] wraps any
//! [`AsyncBufRead`] and pulls one [`Frame`] per call. It never consumes bytes
//! past the end of the frame it returns: anything the underlying buffer holds
//! beyond that point is still there for whoever reads next.

use std::borrow::Cow;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::error::FramingError;

/// Name of the header that carries the payload length.
pub const CONTENT_LENGTH: &str = "Content-Length";

/// Maximum size of a header block, blank line included (8 KiB).
///
/// Real peers send one or two short headers; anything this large is a
/// corrupted stream.
pub const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Maximum declared payload length accepted by the reader (64 MiB).
///
/// Checked before the payload buffer is allocated so a garbage length cannot
/// trigger a huge allocation.
pub const MAX_FRAME_BYTES: usize = 64 * 1024 * 1024;

// ─────────────────────────────────────────────────────────────────────────────
// Frame
// ─────────────────────────────────────────────────────────────────────────────

/// One length-prefixed message as read from the wire, header stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    payload: Bytes,
}

impl Frame {
    /// Wrap a payload.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// The declared (and actual) payload length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty (`Content-Length: 0`).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// The payload bytes.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Consume the frame, returning the payload.
    #[must_use]
    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    /// The payload decoded as UTF-8, with invalid sequences replaced. For logs.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Header Parsing (pure)
// ─────────────────────────────────────────────────────────────────────────────

/// Parse a header block and return the declared payload length.
///
/// `block` holds the header lines, each terminated by `\r\n` or `\n`, without
/// the blank separator line. Header names compare case-insensitively. Headers
/// other than `Content-Length` (e.g. `Content-Type`) are accepted and ignored.
/// A repeated `Content-Length` is accepted only if every value agrees.
///
/// # Errors
///
/// - `MalformedHeader` for a line without a `:` separator
/// - `InvalidContentLength` for an empty or non-decimal value
/// - `ConflictingContentLength` for disagreeing duplicates
/// - `FrameTooLarge` when the length exceeds [`MAX_FRAME_BYTES`]
/// - `MissingContentLength` when no length header is present
pub fn parse_header_block(block: &[u8]) -> Result<usize, FramingError> {
    let mut declared: Option<usize> = None;

    for raw_line in block.split_inclusive(|&b| b == b'\n') {
        let line = strip_line_terminator(raw_line);
        if line.is_empty() {
            continue;
        }

        let Some(colon) = line.iter().position(|&b| b == b':') else {
            return Err(FramingError::MalformedHeader {
                line: String::from_utf8_lossy(line).into_owned(),
            });
        };

        let name = line[..colon].trim_ascii();
        if !name.eq_ignore_ascii_case(CONTENT_LENGTH.as_bytes()) {
            continue;
        }

        let value = line[colon + 1..].trim_ascii();
        let length = parse_length(value)?;
        if length > MAX_FRAME_BYTES {
            return Err(FramingError::FrameTooLarge {
                declared: length,
                max_bytes: MAX_FRAME_BYTES,
            });
        }

        match declared {
            Some(first) if first != length => {
                return Err(FramingError::ConflictingContentLength {
                    first,
                    second: length,
                });
            }
            _ => declared = Some(length),
        }
    }

    declared.ok_or(FramingError::MissingContentLength)
}

/// Parse a decimal length. `usize::from_str` would also accept a leading `+`,
/// which no peer sends, so digits are checked explicitly.
fn parse_length(value: &[u8]) -> Result<usize, FramingError> {
    let invalid = || FramingError::InvalidContentLength {
        value: String::from_utf8_lossy(value).into_owned(),
    };

    if value.is_empty() || !value.iter().all(u8::is_ascii_digit) {
        return Err(invalid());
    }

    std::str::from_utf8(value)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .ok_or_else(invalid)
}

fn strip_line_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn is_blank_line(line: &[u8]) -> bool {
    line == b"\r\n" || line == b"\n"
}

// ─────────────────────────────────────────────────────────────────────────────
// Async Frame Reader
// ─────────────────────────────────────────────────────────────────────────────

/// Pulls [`Frame`]s off a buffered byte stream, one per call.
#[derive(Debug)]
pub struct FrameReader<R> {
    reader: R,
    header: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> FrameReader<R> {
    /// Create a reader over a buffered stream.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            header: Vec::with_capacity(64),
        }
    }

    /// Read the next frame.
    ///
    /// The header may arrive split across any number of underlying reads.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(frame))`: a complete frame was read
    /// - `Ok(None)`: the stream closed cleanly before the first header byte
    ///
    /// # Errors
    ///
    /// Any [`FramingError`]; the stream position is undefined afterwards.
    pub async fn next_frame(&mut self) -> Result<Option<Frame>, FramingError> {
        self.header.clear();

        let length = loop {
            let line_start = self.header.len();
            let budget = MAX_HEADER_BYTES - line_start;
            let n = read_header_line(&mut self.reader, &mut self.header, budget).await?;

            if n == 0 {
                if self.header.is_empty() {
                    return Ok(None);
                }
                return Err(FramingError::TruncatedHeader {
                    received: self.header.len(),
                });
            }

            let line = &self.header[line_start..];
            if !line.ends_with(b"\n") {
                // EOF in the middle of a header line.
                return Err(FramingError::TruncatedHeader {
                    received: self.header.len(),
                });
            }

            if is_blank_line(line) {
                break parse_header_block(&self.header[..line_start])?;
            }
        };

        let payload = read_payload(&mut self.reader, length).await?;
        tracing::trace!(length, "frame read");
        Ok(Some(Frame::new(payload)))
    }

    /// Mutably borrow the underlying reader.
    ///
    /// Bytes already buffered past the last frame are still readable through it.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    /// Give back the underlying reader, buffered bytes included.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

/// Append one header line (terminator included) to `buf`.
///
/// Consumes from the reader only up to and including the first `\n`, so bytes
/// that follow stay in the reader's buffer. Returns the number of bytes
/// appended; `0` means EOF before any byte, and a short line without `\n`
/// means EOF mid-line.
async fn read_header_line<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    max_bytes: usize,
) -> Result<usize, FramingError> {
    let mut total = 0usize;
    loop {
        let available = reader.fill_buf().await?;

        if available.is_empty() {
            return Ok(total);
        }

        match available.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                let to_consume = pos + 1;
                if total + to_consume > max_bytes {
                    return Err(FramingError::HeaderTooLarge {
                        max_bytes: MAX_HEADER_BYTES,
                    });
                }
                buf.extend_from_slice(&available[..to_consume]);
                total += to_consume;
                reader.consume(to_consume);
                return Ok(total);
            }
            None => {
                let len = available.len();
                if total + len > max_bytes {
                    return Err(FramingError::HeaderTooLarge {
                        max_bytes: MAX_HEADER_BYTES,
                    });
                }
                buf.extend_from_slice(available);
                total += len;
                reader.consume(len);
            }
        }
    }
}

async fn read_payload<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    length: usize,
) -> Result<Bytes, FramingError> {
    let mut payload = BytesMut::zeroed(length);
    let mut filled = 0usize;

    while filled < length {
        let n = reader.read(&mut payload[filled..]).await?;
        if n == 0 {
            return Err(FramingError::TruncatedPayload {
                expected: length,
                received: filled,
            });
        }
        filled += n;
    }

    Ok(payload.freeze())
}
