//! Stdio wrapper around a single language server.
//!
//! - [`relay`]: one-shot capability rewrite of the server's first message,
//!   then raw byte copy
//! - [`proxy`]: server spawn, relay task, exit supervision
//! - [`lifecycle`]: server termination types

pub mod lifecycle;
pub mod proxy;
pub mod relay;
