//! Server → client relay: rewrite the first message, then copy raw bytes.
//!
//! The relay reads exactly one frame from the server. If it is an
//! `initialize` response carrying `result.capabilities`, the capability
//! filter runs on it and the re-serialized message is framed and sent on.
//! Anything else is forwarded byte-for-byte. Either way the relay then stops
//! parsing and copies every following byte unchanged until the server closes
//! its stdout.
//!
//! Later messages are never inspected, even if they carry capabilities too.

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use lspfilter_core::capability::{capabilities_mut, filter_capabilities};
use lspfilter_core::emit::write_frame;
use lspfilter_core::{FilterOutcome, FilterPolicy, FrameReader};

use crate::error::RelayError;

/// Read buffer size for the server's stdout.
const READ_BUFFER_BYTES: usize = 16 * 1024;

/// Logging knobs handed to the relay.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelayOptions {
    /// Log the text of every passthrough chunk at `debug`.
    pub log_traffic: bool,
}

/// Where the relay is in its one-shot lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterceptionState {
    /// Waiting for the first frame.
    Intercepting,
    /// Copying raw bytes. Terminal.
    Passthrough,
}

/// Why the first message was forwarded without filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mismatch {
    /// The payload is not JSON.
    NotJson,
    /// The payload has no `result.capabilities` object.
    NoCapabilities,
}

/// What happened to the first message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interception {
    /// Capabilities were filtered and the message rewritten.
    Filtered(FilterOutcome),
    /// The message was forwarded verbatim.
    Forwarded(Mismatch),
    /// The server closed stdout before sending anything.
    EndOfStream,
    /// The client closed its end before the first message reached it.
    ClientClosed,
}

/// Summary of a finished relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayReport {
    /// Outcome of the first-message interception.
    pub interception: Interception,
    /// Bytes copied after the first message.
    pub passthrough_bytes: u64,
}

/// One-shot intercepting relay from the server's stdout to the client.
pub struct InterceptionRelay<R, W> {
    upstream: FrameReader<BufReader<R>>,
    downstream: W,
    policy: FilterPolicy,
    options: RelayOptions,
    state: InterceptionState,
}

impl<R, W> InterceptionRelay<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Create a relay reading from `upstream` and writing to `downstream`.
    pub fn new(upstream: R, downstream: W, policy: FilterPolicy, options: RelayOptions) -> Self {
        Self {
            upstream: FrameReader::new(BufReader::with_capacity(READ_BUFFER_BYTES, upstream)),
            downstream,
            policy,
            options,
            state: InterceptionState::Intercepting,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> InterceptionState {
        self.state
    }

    /// Run until the server closes its stdout, then shut the client side down.
    ///
    /// # Errors
    ///
    /// - [`RelayError::Framing`] if the first frame is corrupt or truncated
    /// - [`RelayError::Serialize`] if the rewritten message cannot be encoded
    /// - [`RelayError::Downstream`] on a client write failure other than a
    ///   closed pipe, in either phase
    pub async fn run(mut self) -> Result<RelayReport, RelayError> {
        let interception = match self.intercept().await {
            Err(RelayError::Downstream(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                tracing::debug!("client closed stdout before first message, ending relay");
                return Ok(RelayReport {
                    interception: Interception::ClientClosed,
                    passthrough_bytes: 0,
                });
            }
            result => result?,
        };
        self.state = InterceptionState::Passthrough;
        tracing::debug!(state = ?self.state, "first message handled");

        let passthrough_bytes = self.passthrough().await?;
        self.close().await;

        Ok(RelayReport {
            interception,
            passthrough_bytes,
        })
    }

    async fn intercept(&mut self) -> Result<Interception, RelayError> {
        debug_assert_eq!(self.state, InterceptionState::Intercepting);

        let Some(frame) = self.upstream.next_frame().await? else {
            tracing::debug!("server stdout closed before first message");
            return Ok(Interception::EndOfStream);
        };
        tracing::info!(len = frame.len(), response = %frame.text(), "first server message");

        let mut message: Value = match serde_json::from_slice(frame.payload()) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "first server message is not JSON, forwarding as is");
                self.emit(frame.payload()).await?;
                return Ok(Interception::Forwarded(Mismatch::NotJson));
            }
        };

        let Some(capabilities) = capabilities_mut(&mut message) else {
            tracing::debug!("first server message has no result.capabilities, forwarding");
            self.emit(frame.payload()).await?;
            return Ok(Interception::Forwarded(Mismatch::NoCapabilities));
        };

        let outcome = filter_capabilities(capabilities, &self.policy);
        tracing::info!(
            mode = %self.policy.mode(),
            enabled = ?outcome.enabled_names(),
            "enabled capabilities"
        );
        tracing::info!(
            mode = %self.policy.mode(),
            disabled = ?outcome.disabled_names(),
            "disabled capabilities"
        );

        let payload = serde_json::to_vec(&message)?;
        self.emit(&payload).await?;
        Ok(Interception::Filtered(outcome))
    }

    async fn emit(&mut self, payload: &[u8]) -> Result<(), RelayError> {
        write_frame(&mut self.downstream, payload)
            .await
            .map_err(RelayError::Downstream)
    }

    /// Copy raw bytes until EOF, starting with whatever the frame reader
    /// already buffered past the first frame.
    async fn passthrough(&mut self) -> Result<u64, RelayError> {
        let reader = self.upstream.get_mut();
        let mut total = 0u64;

        loop {
            let chunk = match reader.fill_buf().await {
                Ok([]) => {
                    tracing::debug!(total, "server stdout EOF");
                    break;
                }
                Ok(chunk) => chunk,
                Err(e) => {
                    tracing::warn!(error = %e, total, "server stdout read failed, ending relay");
                    break;
                }
            };
            let len = chunk.len();

            if self.options.log_traffic {
                tracing::debug!(len, data = %String::from_utf8_lossy(chunk), "passthrough");
            }

            if let Err(e) = write_chunk(&mut self.downstream, chunk).await {
                if e.kind() == std::io::ErrorKind::BrokenPipe {
                    tracing::debug!(total, "client closed stdout, ending relay");
                    return Ok(total);
                }
                return Err(RelayError::Downstream(e));
            }

            reader.consume(len);
            total += len as u64;
        }

        Ok(total)
    }

    async fn close(&mut self) {
        if let Err(e) = self.downstream.shutdown().await {
            tracing::debug!(error = %e, "client stdout shutdown failed");
        }
    }
}

async fn write_chunk<W: AsyncWrite + Unpin>(
    writer: &mut W,
    chunk: &[u8],
) -> Result<(), std::io::Error> {
    writer.write_all(chunk).await?;
    writer.flush().await
}
