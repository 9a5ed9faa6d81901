//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory where models are stored
    pub model_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("~/.prism/models"),
        }
    }
}

/// What to do when a single image fails to decode mid-search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeErrorPolicy {
    /// Fail the whole search (no partial result set)
    Abort,
    /// Drop the image with a warning and keep going
    Skip,
}

/// Search tuning defaults; individual CLI flags override these.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Minimum fused score for a result to be kept (inclusive)
    pub threshold: f64,

    /// Maximum number of results returned
    pub max_results: usize,

    /// Fuse the auxiliary classifier score into the ranking
    pub use_classifier: bool,

    /// Blend between visual and label-semantic score, in [0, 1].
    /// 0.3 keeps the visual score as the primary signal while letting
    /// matching labels nudge the ranking.
    pub fusion_weight: f64,

    /// Labels requested from the classifier per image
    pub top_k: usize,

    /// Per-image decode failure policy
    pub on_decode_error: DecodeErrorPolicy,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            max_results: 100,
            use_classifier: false,
            fusion_weight: 0.3,
            top_k: 5,
            on_decode_error: DecodeErrorPolicy::Abort,
        }
    }
}

/// Enumeration and batching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Extensions treated as images (case-insensitive)
    pub supported_formats: Vec<String>,

    /// Images stacked per ONNX embedding call
    pub embed_batch_size: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            supported_formats: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "bmp".to_string(),
                "webp".to_string(),
                "gif".to_string(),
            ],
            embed_batch_size: 16,
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,

    /// Decode timeout in milliseconds
    pub decode_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 100,
            max_image_dimension: 10000,
            decode_timeout_ms: 5000,
        }
    }
}

/// Embedding model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Model name/variant ("siglip-base-patch16" or "siglip-base-patch16-384")
    pub model: String,

    /// Image input size — derived from model variant, not set directly.
    /// 224 for base, 384 for 384 variant.
    pub image_size: u32,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "siglip-base-patch16".to_string(),
            image_size: 224,
        }
    }
}

impl EmbeddingConfig {
    /// Resolve image size from model name.
    pub fn image_size_for_model(model: &str) -> u32 {
        if model.contains("384") {
            384
        } else {
            224
        }
    }
}

/// Auxiliary classifier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Classifier model name
    pub model: String,

    /// Image input size expected by the classifier
    pub image_size: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model: "mobilenet-v2".to_string(),
            image_size: 224,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format ("json" or "jsonl")
    pub format: String,

    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            pretty: false,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
