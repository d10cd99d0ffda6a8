//! Connector discovery manifest handling.
//!
//! This crate is used by:
//! - `stelae-manifest-edge` (serving `/.well-known/mcp/manifest.json`)
//! - `stelae-manifest-admin` (offline rendering and live compliance checks)
//!
//! It contains **no** networking and **no** storage logic. Everything here operates on JSON
//! values handed in by the caller.

pub mod compliance;
pub mod error;
pub mod fallback;
pub mod model;
pub mod normalize;
pub mod tools;

pub use error::{ManifestError, Result};
pub use model::{ServerDescriptor, ToolDescriptor};
pub use normalize::{Resolution, ResolutionOutcome, normalize, resolve};
pub use tools::{Allowlist, reconcile};

/// Path clients fetch the manifest from.
pub const MANIFEST_PATH: &str = "/.well-known/mcp/manifest.json";

/// Relative path of the streamable HTTP protocol endpoint served by the origin.
pub const ENDPOINT_PATH: &str = "/mcp";

/// Absolute protocol endpoint URL for a given request origin (`scheme://host[:port]`).
#[must_use]
pub fn endpoint_url(origin: &str) -> String {
    format!("{}{ENDPOINT_PATH}", origin.trim_end_matches('/'))
}
