//! Core data types for Prism search requests and responses.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A single ranked match from a search.
///
/// `rank` is assigned only after filtering, sorting, and truncation —
/// a freshly scored candidate has no rank yet (see `search::ranker`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Absolute path to the matched image
    pub image_path: PathBuf,

    /// Just the filename portion
    pub file_name: String,

    /// 1-based position in the ranked output
    pub rank: u32,

    /// Fused similarity score in [-1, 1]
    pub similarity: f64,

    /// Visual (CLIP-space) cosine similarity, when score breakdown is kept
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visual_score: Option<f64>,

    /// Label-semantic score from the auxiliary classifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aux_score: Option<f64>,

    /// Labels the auxiliary classifier predicted for this image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_labels: Option<Vec<String>>,
}

/// Summary statistics for one search call.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SearchStats {
    /// Files in the folder matching a supported image extension
    pub total_images: usize,

    /// Results that survived threshold filtering and truncation
    pub matching_images: usize,

    /// Wall-clock time for the whole search
    pub processing_time_ms: f64,

    /// The query that was searched
    pub query: String,
}

/// Everything a single search call needs.
///
/// Defaults mirror the config-file `[search]` section; the CLI
/// overrides individual fields from flags.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Folder to search (non-recursive)
    pub image_folder: PathBuf,

    /// Free-text query
    pub query: String,

    /// Minimum fused score for a result to be kept (inclusive)
    pub threshold: f64,

    /// Result cap after sorting
    pub max_results: usize,

    /// Whether to fuse in the auxiliary classifier score
    pub use_classifier: bool,

    /// Blend between visual and label-semantic score, in [0, 1]
    pub fusion_weight: f64,
}

impl SearchRequest {
    /// Build a request for a folder and query with default tuning.
    pub fn new(image_folder: impl Into<PathBuf>, query: impl Into<String>) -> Self {
        Self {
            image_folder: image_folder.into(),
            query: query.into(),
            threshold: 0.3,
            max_results: 100,
            use_classifier: false,
            fusion_weight: 0.3,
        }
    }
}

/// The complete output of one search call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
    pub stats: SearchStats,
}
