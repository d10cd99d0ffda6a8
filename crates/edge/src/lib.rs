//! Edge handler for the MCP connector manifest.
//!
//! Serves `/.well-known/mcp/manifest.json` from a manifest store (normalized for the
//! requesting origin), answers `/__diag` and `/`, and forwards every other path to the origin.

pub mod config;
pub mod context;
pub mod diag;
pub mod error;
pub mod forward;
pub mod logging;
pub mod manifest;
pub mod origin;
pub mod router;
pub mod store;

pub use context::EdgeContext;
pub use error::{EdgeError, Result};
pub use router::router;
