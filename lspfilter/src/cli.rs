//! CLI argument types for `lspfilter`.
//!
//! Defined outside `main.rs` so integration tests can parse them directly and
//! check the conversion into a [`WrapperConfig`].

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use lspfilter_core::FilterPolicy;

use crate::error::WrapperError;
use crate::shim::proxy::WrapperConfig;
use crate::shim::relay::RelayOptions;

const LONG_ABOUT: &str = "\
LSP server wrapper

Filtering (--enable/--disable) allows to run multiple servers with only one of
them providing specific capabilities.

PROVIDERS are language server capabilities without the \"Provider\" at the end
(see the serverCapabilities section of the LSP specification for the complete
list).";

const AFTER_HELP: &str = "\
Examples:
  lspfilter --enable completion,codeAction -- clangd
  lspfilter --disable completion,codeAction -- ccls";

/// Hide selected language-server capabilities from the client.
#[derive(Parser, Debug)]
#[command(
    name = "lspfilter",
    version,
    long_about = LONG_ABOUT,
    after_help = AFTER_HELP,
    override_usage = "lspfilter [-l FILENAME] [-v]... [-e PROVIDERS | -d PROVIDERS] -- <COMMAND>..."
)]
pub struct Cli {
    /// Allow only the providers from PROVIDERS (comma-separated).
    #[arg(short, long, value_name = "PROVIDERS", value_delimiter = ',')]
    pub enable: Vec<String>,

    /// Allow all providers except those from PROVIDERS (comma-separated).
    #[arg(short, long, value_name = "PROVIDERS", value_delimiter = ',')]
    pub disable: Vec<String>,

    /// Write log to FILENAME (default: stderr).
    #[arg(short, long, value_name = "FILENAME")]
    pub log: Option<PathBuf>,

    /// Verbosity level, repeat to increase verbosity.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Server command and arguments (after `--`).
    #[arg(trailing_var_arg = true, required = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

impl Cli {
    /// Validate the arguments and build the wrapper configuration.
    ///
    /// # Errors
    ///
    /// - [`WrapperError::Policy`] if both `--enable` and `--disable` are given
    /// - [`WrapperError::EmptyCommand`] if no server command is present
    pub fn to_config(&self) -> Result<WrapperConfig, WrapperError> {
        let policy = FilterPolicy::new(&self.enable, &self.disable)?;

        let (command, args) = self
            .command
            .split_first()
            .ok_or(WrapperError::EmptyCommand)?;

        Ok(WrapperConfig {
            command: command.clone(),
            args: args.to_vec(),
            policy,
            relay: RelayOptions {
                log_traffic: self.verbose > 0,
            },
        })
    }
}

/// Tracing filter directive for a `-v` count.
///
/// `None` means "no flag given": the caller falls back to `RUST_LOG`, then
/// `info`.
#[must_use]
pub fn verbosity_directive(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("debug"),
        _ => Some("trace"),
    }
}
