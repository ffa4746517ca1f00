//! Language-server wrapper: spawn the server, relay its stdout, wait for exit.
//!
//! The server inherits this process's stdin and stderr, so client requests and
//! server diagnostics flow through the OS untouched. Only stdout is piped, and
//! it is drained by the [`InterceptionRelay`] running as its own task.
//!
//! The relay must run concurrently with `wait()`: a server that fills its
//! stdout pipe before exiting would otherwise block forever on a reader that
//! never starts. The two tasks share nothing; the relay ends when the server's
//! stdout closes and the supervisor joins it before returning.

use std::process::{ExitStatus, Stdio};

use tokio::io::AsyncWrite;
use tokio::process::Command;
use tokio::task::JoinError;

use lspfilter_core::FilterPolicy;

use crate::error::{RelayError, WrapperError};
use crate::shim::lifecycle::ServerExit;
use crate::shim::relay::{Interception, InterceptionRelay, RelayOptions, RelayReport};

/// Everything needed to run one wrapped server.
#[derive(Debug, Clone)]
pub struct WrapperConfig {
    /// Server executable.
    pub command: String,
    /// Server arguments.
    pub args: Vec<String>,
    /// Capability filter applied to the `initialize` response.
    pub policy: FilterPolicy,
    /// Relay logging options.
    pub relay: RelayOptions,
}

/// Which of the two tasks finished first.
enum FirstDone {
    Relay(Result<RelayReport, WrapperError>),
    Server(std::io::Result<ExitStatus>),
}

/// Run the wrapped server with its stdout relayed to this process's stdout.
///
/// # Errors
///
/// See [`run_wrapper_with_output`].
pub async fn run_wrapper(config: WrapperConfig) -> Result<RelayReport, WrapperError> {
    run_wrapper_with_output(config, tokio::io::stdout()).await
}

/// Run the wrapped server, relaying its stdout into `downstream`.
///
/// Returns once the server has exited and the relay has drained its stdout.
///
/// # Errors
///
/// - [`WrapperError::SubprocessLaunch`] if the server cannot be spawned
/// - [`WrapperError::StdoutNotCaptured`] if the spawned server has no stdout pipe
/// - [`WrapperError::Relay`] if the relay fails; the server is killed
/// - [`WrapperError::SubprocessExit`] if the server exits unsuccessfully
/// - [`WrapperError::Io`] if waiting on the server fails
pub async fn run_wrapper_with_output<W>(
    config: WrapperConfig,
    downstream: W,
) -> Result<RelayReport, WrapperError>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let WrapperConfig {
        command,
        args,
        policy,
        relay: relay_options,
    } = config;

    tracing::info!(command = %command, args = ?args, mode = %policy.mode(), "running server");

    let mut child = Command::new(&command)
        .args(&args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| WrapperError::SubprocessLaunch {
            command: command.clone(),
            source,
        })?;

    let server_stdout = child
        .stdout
        .take()
        .ok_or_else(|| WrapperError::StdoutNotCaptured {
            command: command.clone(),
        })?;

    tracing::debug!(pid = ?child.id(), "server process spawned");

    let relay = InterceptionRelay::new(server_stdout, downstream, policy, relay_options);
    let mut relay_handle = tokio::spawn(relay.run());

    let first = tokio::select! {
        joined = &mut relay_handle => FirstDone::Relay(flatten_relay(joined)),
        status = child.wait() => FirstDone::Server(status),
    };

    let (report, status) = match first {
        FirstDone::Relay(Ok(report)) => {
            tracing::debug!("server stdout closed, waiting for exit");
            let status = child.wait().await.map_err(WrapperError::Io)?;
            (report, status)
        }
        FirstDone::Relay(Err(e)) => {
            tracing::error!(error = %e, "relay failed, killing server");
            if let Err(kill_err) = child.kill().await {
                tracing::warn!(error = %kill_err, "failed to kill server");
            }
            return Err(e);
        }
        FirstDone::Server(status) => {
            let status = status.map_err(WrapperError::Io)?;
            tracing::debug!(?status, "server exited, draining stdout");
            let report = flatten_relay(relay_handle.await)?;
            (report, status)
        }
    };

    log_report(&report);

    let exit = ServerExit::from(status);
    tracing::info!(%exit, "server process exited");
    if !exit.success() {
        return Err(WrapperError::SubprocessExit { exit });
    }
    Ok(report)
}

fn flatten_relay(
    joined: Result<Result<RelayReport, RelayError>, JoinError>,
) -> Result<RelayReport, WrapperError> {
    match joined {
        Ok(result) => result.map_err(WrapperError::from),
        Err(e) => Err(WrapperError::RelayAborted {
            reason: e.to_string(),
        }),
    }
}

fn log_report(report: &RelayReport) {
    let interception = match &report.interception {
        Interception::Filtered(_) => "filtered",
        Interception::Forwarded(_) => "forwarded",
        Interception::EndOfStream => "end_of_stream",
        Interception::ClientClosed => "client_closed",
    };
    tracing::debug!(
        interception,
        passthrough_bytes = report.passthrough_bytes,
        "relay finished"
    );
}
