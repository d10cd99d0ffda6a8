//! Error types for manifest handling.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    /// The stored text is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The stored text is valid JSON but not an object.
    #[error("manifest must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

pub type Result<T> = std::result::Result<T, ManifestError>;
