//! SigLIP embedding generation — the shared image/text vector space.
//!
//! The engine pairs a vision encoder and a text encoder from the same
//! SigLIP checkpoint, so image embeddings and query embeddings can be
//! compared by dot product. All returned vectors are L2-normalized.

pub(crate) mod preprocess;
mod text;
mod vision;

pub use text::TextEncoder;
pub use vision::VisionSession;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use image::DynamicImage;
use ndarray::Array4;

use crate::config::EmbeddingConfig;
use crate::error::SearchError;

use self::preprocess::{preprocess, SIGLIP_MEAN, SIGLIP_STD};

/// The vision encoder ONNX model filename.
const VISUAL_MODEL_FILENAME: &str = "visual.onnx";

/// Process-wide description of the loaded embedding runtime.
///
/// Computed once during engine load and exposed read-only; there is no
/// teardown within the process lifetime.
#[derive(Debug, Clone)]
pub struct EngineInfo {
    /// Model variant name
    pub model: String,
    /// Dimensionality of the shared embedding space
    pub embedding_dim: usize,
    /// Vision input size (224 or 384)
    pub image_size: u32,
}

static ENGINE_INFO: OnceLock<EngineInfo> = OnceLock::new();

/// Runtime descriptor for the loaded embedding engine, if one has been
/// loaded in this process.
pub fn engine_info() -> Option<&'static EngineInfo> {
    ENGINE_INFO.get()
}

/// Engine for generating image and text embeddings via SigLIP.
pub struct EmbeddingEngine {
    vision: VisionSession,
    text: TextEncoder,
    image_size: u32,
}

impl EmbeddingEngine {
    /// Load the SigLIP vision and text encoders from the model directory.
    ///
    /// Expects the vision model at `{model_dir}/{model_name}/visual.onnx`
    /// and the shared text encoder files directly in `model_dir`.
    pub fn load(config: &EmbeddingConfig, model_dir: &Path) -> Result<Self, SearchError> {
        let model_path = Self::model_path(config, model_dir);

        if !model_path.exists() {
            return Err(SearchError::Model {
                message: format!(
                    "Vision encoder not found at {:?}. Run `prism models download` first.",
                    model_path
                ),
            });
        }

        tracing::info!("Loading SigLIP vision encoder from {:?}", model_path);
        let vision = VisionSession::load(&model_path)?;

        tracing::info!("Loading SigLIP text encoder");
        let text = TextEncoder::load(model_dir)?;

        let engine = Self {
            vision,
            text,
            image_size: config.image_size,
        };

        let _ = ENGINE_INFO.set(EngineInfo {
            model: config.model.clone(),
            embedding_dim: engine.text.embedding_dim(),
            image_size: config.image_size,
        });

        tracing::info!("Embedding engine ready (dim {})", engine.text.embedding_dim());
        Ok(engine)
    }

    /// The vision input size for this model (224 or 384).
    pub fn image_size(&self) -> u32 {
        self.image_size
    }

    /// Preprocess a decoded image into a vision-model input tensor.
    pub fn preprocess(&self, image: &DynamicImage) -> Array4<f32> {
        preprocess(image, self.image_size, SIGLIP_MEAN, SIGLIP_STD)
    }

    /// Embed a single image. Returns an L2-normalized vector.
    pub fn embed_image(&self, image: &DynamicImage, path: &Path) -> Result<Vec<f32>, SearchError> {
        let tensor = self.preprocess(image);
        self.vision.embed(&tensor, path)
    }

    /// Embed a batch of already-preprocessed image tensors in one ONNX
    /// call. Returns one L2-normalized vector per input.
    pub fn embed_preprocessed_batch(
        &self,
        tensors: &[Array4<f32>],
        paths: &[PathBuf],
    ) -> Result<Vec<Vec<f32>>, SearchError> {
        self.vision.embed_batch(tensors, paths)
    }

    /// Embed a text string (a query or a label prompt).
    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>, SearchError> {
        self.text.encode(text)
    }

    /// Embed a batch of text strings.
    pub fn embed_text_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SearchError> {
        self.text.encode_batch(texts)
    }

    /// Check whether the model files exist on disk.
    pub fn model_exists(config: &EmbeddingConfig, model_dir: &Path) -> bool {
        Self::model_path(config, model_dir).exists() && TextEncoder::model_exists(model_dir)
    }

    /// Get the expected vision model file path.
    pub fn model_path(config: &EmbeddingConfig, model_dir: &Path) -> PathBuf {
        model_dir.join(&config.model).join(VISUAL_MODEL_FILENAME)
    }
}
