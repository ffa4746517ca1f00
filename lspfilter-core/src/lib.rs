//! lspfilter core: language-server wire framing and capability filtering.
//!
//! This library holds the pieces of the wrapper that touch protocol bytes:
//!
//! - [`framing`]: `Content-Length` frame reader and pure header parser
//! - [`emit`]: frame encoder/writer, the inverse of [`framing`]
//! - [`capability`]: filter policy and the `initialize` capability rewrite
//! - [`error`]: framing and policy errors
//!
//! Process handling, CLI and the relay loop live in the `lspfilter` crate.

pub mod capability;
pub mod emit;
pub mod error;
pub mod framing;

pub use capability::{FilterMode, FilterOutcome, FilterPolicy};
pub use error::{FramingError, PolicyError};
pub use framing::{Frame, FrameReader};
