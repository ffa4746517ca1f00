//! Frame emission: the inverse of [`FrameReader`](crate::framing::FrameReader).

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::framing::CONTENT_LENGTH;

/// Encode a payload as a complete frame: header, blank line, payload.
#[must_use]
pub fn encode_frame(payload: &[u8]) -> Bytes {
    let header = format!("{CONTENT_LENGTH}: {}\r\n\r\n", payload.len());
    let mut buf = BytesMut::with_capacity(header.len() + payload.len());
    buf.put_slice(header.as_bytes());
    buf.put_slice(payload);
    buf.freeze()
}

/// Write one framed message and flush.
///
/// Header and payload go out in a single `write_all` so a frame is never
/// split by a partial write of the header alone.
///
/// # Errors
///
/// Returns the underlying IO error from the write or the flush.
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    payload: &[u8],
) -> Result<(), std::io::Error> {
    writer.write_all(&encode_frame(payload)).await?;
    writer.flush().await
}
