//! Prism Core - semantic image search as a library.
//!
//! Prism ranks the images in a local folder by similarity to a
//! free-text query. A SigLIP vision/text encoder pair provides the
//! shared embedding space; an optional MobileNetV2 classifier adds a
//! label-semantic signal that is linearly fused into the ranking.
//!
//! # Architecture
//!
//! ```text
//! Folder → Enumerate → Decode → Embed (SigLIP) ┐
//!                            └→ Classify (opt) ┤→ Score → Rank → Results
//! Query  → Embed text ──────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use prism_core::{Config, SearchEngine, SearchRequest};
//!
//! #[tokio::main]
//! async fn main() -> prism_core::Result<()> {
//!     let config = Config::load()?;
//!     let engine = SearchEngine::load(&config).await?;
//!
//!     let request = SearchRequest::new("./photos", "a snowy mountain at sunset");
//!     let response = engine.search(&request).await?;
//!     for hit in &response.results {
//!         println!("{:>3}. {:.3}  {}", hit.rank, hit.similarity, hit.file_name);
//!     }
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod classify;
pub mod config;
pub mod embedding;
pub mod error;
pub mod math;
pub mod output;
pub mod pipeline;
pub mod search;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use embedding::{engine_info, EmbeddingEngine, EngineInfo};
pub use error::{ConfigError, PrismError, Result, SearchError};
pub use output::{OutputFormat, OutputWriter};
pub use search::SearchEngine;
pub use types::{SearchHit, SearchRequest, SearchResponse, SearchStats};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
