//! Error types for the relay and the wrapper process.
//!
//! `RelayError` covers failures inside the stdout relay task: a corrupt frame
//! from the server, a failure to re-serialize the rewritten handshake, or a
//! write error towards the client.
//!
//! `WrapperError` covers everything the `lspfilter` binary can fail on, from
//! configuration through subprocess launch and exit.

use std::path::PathBuf;

use lspfilter_core::{FramingError, PolicyError};

use crate::shim::lifecycle::ServerExit;

/// Errors that end the stdout relay.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The server's stdout is not a valid `Content-Length` stream.
    #[error("Framing error on server stdout: {0}")]
    Framing(#[from] FramingError),

    /// The filtered `initialize` response could not be serialized.
    #[error("Failed to serialize filtered message: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Writing to the client failed.
    #[error("Failed to write to client: {0}")]
    Downstream(std::io::Error),
}

/// Errors surfaced by the `lspfilter` binary.
#[derive(Debug, thiserror::Error)]
pub enum WrapperError {
    /// The enable/disable configuration is invalid.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// No server command was given.
    #[error("empty command")]
    EmptyCommand,

    /// The log file could not be opened.
    #[error("can not open log file {}: {source}", path.display())]
    LogFile {
        /// The requested log path.
        path: PathBuf,
        /// The underlying open error.
        source: std::io::Error,
    },

    /// The server executable could not be started.
    #[error("failed to start {command}: {source}")]
    SubprocessLaunch {
        /// The executable that was requested.
        command: String,
        /// The underlying spawn error.
        source: std::io::Error,
    },

    /// The server started but its stdout pipe was not handed over.
    #[error("failed to capture stdout of {command}")]
    StdoutNotCaptured {
        /// The executable that was started.
        command: String,
    },

    /// The server exited unsuccessfully.
    #[error("command failed: {exit}")]
    SubprocessExit {
        /// How the server terminated.
        exit: ServerExit,
    },

    /// The relay task failed.
    #[error(transparent)]
    Relay(#[from] RelayError),

    /// The relay task panicked or was cancelled.
    #[error("relay task aborted: {reason}")]
    RelayAborted {
        /// Description from the join error.
        reason: String,
    },

    /// An underlying IO error occurred while supervising the server.
    #[error("IO error: {0}")]
    Io(std::io::Error),
}
