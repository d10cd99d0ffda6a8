//! Error types for the manifest edge.

use thiserror::Error;

/// Main error type for the edge.
#[derive(Error, Debug)]
pub enum EdgeError {
    /// Configuration errors (invalid YAML, missing fields, bad URLs)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Manifest store read failures (not absence)
    #[error("Store error: {0}")]
    Store(String),

    /// Origin forwarding failures (connect, TLS, broken stream)
    #[error("Forward error: {0}")]
    Forward(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for edge operations.
pub type Result<T> = std::result::Result<T, EdgeError>;
