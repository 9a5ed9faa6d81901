//! Auxiliary image classification for label-semantic scoring.
//!
//! A MobileNetV2 classifier predicts ImageNet labels for each image;
//! the labels' precomputed SigLIP text embeddings (the label bank) are
//! then compared against the query embedding to produce a secondary
//! ranking signal. Classification is strictly auxiliary: a per-image
//! failure degrades to an empty label list, never an error.

pub mod label_bank;
pub mod labels;
mod session;

pub use label_bank::LabelBank;
pub use labels::LabelVocabulary;
pub use session::ClassifierSession;

use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::config::ClassifierConfig;
use crate::embedding::preprocess::{preprocess, IMAGENET_MEAN, IMAGENET_STD};
use crate::embedding::EmbeddingEngine;
use crate::error::SearchError;

use self::session::{softmax, top_k_indices};

/// The classifier ONNX model filename.
const CLASSIFIER_MODEL_FILENAME: &str = "model.onnx";

/// The checkpoint config carrying the id2label map.
const CLASSIFIER_CONFIG_FILENAME: &str = "config.json";

/// Cached label-bank filename.
const LABEL_BANK_FILENAME: &str = "classifier_labels.bank";

/// Labels encoded per text-encoder call while building the bank.
const BANK_ENCODE_BATCH: usize = 64;

/// The auxiliary label provider: classifier session, its vocabulary,
/// and the precomputed label embedding table.
pub struct Classifier {
    session: ClassifierSession,
    vocabulary: LabelVocabulary,
    label_bank: LabelBank,
    image_size: u32,
}

impl Classifier {
    /// Load the classifier and build (or reload) its label bank.
    ///
    /// The bank is encoded with the embedding engine's text encoder on
    /// first run and cached under `bank_dir`; later runs reload the
    /// cache as long as the vocabulary hash matches.
    pub fn load(
        config: &ClassifierConfig,
        model_dir: &Path,
        bank_dir: &Path,
        embedder: &EmbeddingEngine,
    ) -> Result<Self, SearchError> {
        let model_path = Self::model_path(config, model_dir);
        if !model_path.exists() {
            return Err(SearchError::Model {
                message: format!(
                    "Classifier model not found at {:?}. Run `prism models download` first.",
                    model_path
                ),
            });
        }

        tracing::info!("Loading classifier from {:?}", model_path);
        let session = ClassifierSession::load(&model_path)?;

        let vocab_path = model_dir.join(&config.model).join(CLASSIFIER_CONFIG_FILENAME);
        let vocabulary = LabelVocabulary::load(&vocab_path)?;

        let label_bank = Self::load_or_build_bank(&vocabulary, bank_dir, embedder)?;

        Ok(Self {
            session,
            vocabulary,
            label_bank,
            image_size: config.image_size,
        })
    }

    fn load_or_build_bank(
        vocabulary: &LabelVocabulary,
        bank_dir: &Path,
        embedder: &EmbeddingEngine,
    ) -> Result<LabelBank, SearchError> {
        let bank_path = bank_dir.join(LABEL_BANK_FILENAME);
        let vocab_hash = vocabulary.content_hash();

        if bank_path.exists() && LabelBank::cache_valid(&bank_path, &vocab_hash) {
            return LabelBank::load(&bank_path, vocabulary);
        }

        let bank = LabelBank::encode_all(vocabulary, embedder, BANK_ENCODE_BATCH)?;

        std::fs::create_dir_all(bank_dir).map_err(|e| SearchError::Model {
            message: format!("Failed to create {:?}: {}", bank_dir, e),
        })?;
        if let Err(e) = bank.save(&bank_path, &vocab_hash) {
            // A failed cache write costs a re-encode next run, nothing more.
            tracing::warn!("Could not cache label bank: {e}");
        }

        Ok(bank)
    }

    /// Predict up to `top_k` labels for an image.
    ///
    /// Classification is auxiliary — any failure is logged at warning
    /// level and collapsed to an empty list so the search continues on
    /// the visual score alone.
    pub fn classify(&self, image: &DynamicImage, path: &Path, top_k: usize) -> Vec<String> {
        match self.classify_inner(image, top_k) {
            Ok(labels) => labels,
            Err(e) => {
                tracing::warn!("Classification failed for {:?}: {e} — skipping labels", path);
                Vec::new()
            }
        }
    }

    fn classify_inner(
        &self,
        image: &DynamicImage,
        top_k: usize,
    ) -> Result<Vec<String>, SearchError> {
        let tensor = preprocess(image, self.image_size, IMAGENET_MEAN, IMAGENET_STD);
        let logits = self.session.logits(&tensor)?;
        let probs = softmax(&logits);

        let labels = top_k_indices(&probs, top_k)
            .into_iter()
            .filter_map(|i| self.vocabulary.get(i).map(str::to_string))
            .collect();
        Ok(labels)
    }

    /// The precomputed label → embedding table.
    pub fn label_bank(&self) -> &LabelBank {
        &self.label_bank
    }

    /// The classifier's label vocabulary.
    pub fn vocabulary(&self) -> &LabelVocabulary {
        &self.vocabulary
    }

    /// Check whether the classifier model files exist on disk.
    pub fn model_exists(config: &ClassifierConfig, model_dir: &Path) -> bool {
        Self::model_path(config, model_dir).exists()
            && model_dir
                .join(&config.model)
                .join(CLASSIFIER_CONFIG_FILENAME)
                .exists()
    }

    /// Get the expected classifier model file path.
    pub fn model_path(config: &ClassifierConfig, model_dir: &Path) -> PathBuf {
        model_dir.join(&config.model).join(CLASSIFIER_MODEL_FILENAME)
    }
}
