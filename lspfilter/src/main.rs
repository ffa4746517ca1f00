//! lspfilter CLI entry point.
//!
//! Parses arguments, sets up the log sink, runs the wrapped server and maps
//! the outcome to an exit code.

use std::path::Path;

use clap::Parser;

use lspfilter::cli::{Cli, verbosity_directive};
use lspfilter::error::WrapperError;
use lspfilter::shim::proxy::run_wrapper;

// ─────────────────────────────────────────────────────────────────────────────
// Entry Point
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let code = run(cli).await;
    std::process::exit(code);
}

async fn run(cli: Cli) -> i32 {
    // Reject bad flag combinations before touching the log file or the server.
    let config = match cli.to_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("lspfilter: {e}");
            return 1;
        }
    };

    if let Err(e) = init_tracing(cli.verbose, cli.log.as_deref()) {
        eprintln!("lspfilter: {e}");
        return 1;
    }

    match run_wrapper(config).await {
        Ok(_) => 0,
        Err(e) => {
            tracing::error!(error = %e, "lspfilter failed");
            eprintln!("lspfilter: {e}");
            1
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tracing Init
// ─────────────────────────────────────────────────────────────────────────────

/// Initialise the tracing subscriber.
///
/// Logs go to `log_file` (truncated, no ANSI colours) when given, otherwise to
/// stderr; stdout carries protocol traffic and must stay clean. With no `-v`
/// the filter comes from `RUST_LOG`, defaulting to `info`.
fn init_tracing(verbose: u8, log_file: Option<&Path>) -> Result<(), WrapperError> {
    use tracing_subscriber::EnvFilter;

    let filter = match verbosity_directive(verbose) {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)
                .map_err(|source| WrapperError::LogFile {
                    path: path.to_path_buf(),
                    source,
                })?;
            builder
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }

    Ok(())
}
