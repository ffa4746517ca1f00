//! lspfilter: language-server wrapper that hides selected capabilities.
//!
//! Sits between an editor and a language server on stdio. The server's first
//! message (the `initialize` response) has its `<name>Provider` capabilities
//! filtered; everything after it is relayed byte-for-byte.

pub mod cli;
pub mod error;
pub mod shim;
