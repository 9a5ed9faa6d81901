//! Error types for the Prism search engine.
//!
//! Errors are organized by stage so messages carry actionable context
//! (file paths, stage names, specific issues). Initialization failures
//! are always fatal; per-image classification failures are recovered
//! inside the classifier and never surface here.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Prism operations.
#[derive(Error, Debug)]
pub enum PrismError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Search pipeline errors
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Search pipeline errors, organized by stage.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The image folder to search does not exist
    #[error(
        "Image folder not found: {path}\n  \
         Hint: create the folder (`mkdir -p {path:?}`) or check the path for typos."
    )]
    DirectoryNotFound { path: PathBuf },

    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Embedding generation failed — fatal, no score can be computed
    #[error("Embedding failed for {path}: {message}")]
    Embedding { path: PathBuf, message: String },

    /// A model or collaborator failed to load
    #[error("Model error: {message}")]
    Model { message: String },

    /// Operation timed out
    #[error("Timeout in {stage} stage for {path} after {timeout_ms}ms")]
    Timeout {
        path: PathBuf,
        stage: String,
        timeout_ms: u64,
    },

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Image dimensions exceed limit
    #[error("Image too large: {path} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Unsupported image format
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// Filesystem errors during enumeration, propagated unmodified
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Prism results.
pub type Result<T> = std::result::Result<T, PrismError>;

/// Convenience type alias for search-stage results.
pub type SearchResult<T> = std::result::Result<T, SearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_not_found_message_carries_hint() {
        let err = SearchError::DirectoryNotFound {
            path: PathBuf::from("/photos/vacation"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/photos/vacation"));
        assert!(msg.contains("Hint:"));
    }

    #[test]
    fn io_error_is_propagated_unmodified() {
        let inner = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = SearchError::from(inner);
        assert!(err.to_string().contains("denied"));
    }
}
