//! Classifier label vocabulary.
//!
//! The MobileNetV2 checkpoint ships a `config.json` whose `id2label`
//! map assigns an ImageNet-1k label string to each output index.
//! Labels are synonym lists ("tench, Tinca tinca"); the first synonym
//! is used when building text prompts.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::SearchError;

#[derive(Deserialize)]
struct ModelConfigFile {
    id2label: HashMap<String, String>,
}

/// The classifier's fixed label vocabulary, ordered by output index.
pub struct LabelVocabulary {
    labels: Vec<String>,
    by_name: HashMap<String, usize>,
}

impl LabelVocabulary {
    /// Load the vocabulary from a checkpoint `config.json`.
    pub fn load(config_path: &Path) -> Result<Self, SearchError> {
        let content = std::fs::read_to_string(config_path).map_err(|e| SearchError::Model {
            message: format!("Failed to read {:?}: {}", config_path, e),
        })?;
        let parsed: ModelConfigFile =
            serde_json::from_str(&content).map_err(|e| SearchError::Model {
                message: format!("Failed to parse {:?}: {}", config_path, e),
            })?;

        if parsed.id2label.is_empty() {
            return Err(SearchError::Model {
                message: format!("{:?} has an empty id2label map", config_path),
            });
        }

        // id2label keys are stringified indices; order by index so the
        // vocabulary lines up with the model's logit positions.
        let mut indexed: Vec<(usize, String)> = Vec::with_capacity(parsed.id2label.len());
        for (key, label) in parsed.id2label {
            let idx: usize = key.parse().map_err(|_| SearchError::Model {
                message: format!("Non-numeric id2label key {:?} in {:?}", key, config_path),
            })?;
            indexed.push((idx, label));
        }
        indexed.sort_by_key(|(idx, _)| *idx);

        let labels: Vec<String> = indexed.into_iter().map(|(_, label)| label).collect();
        let by_name: HashMap<String, usize> = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), i))
            .collect();

        tracing::info!("Loaded classifier vocabulary: {} labels", labels.len());
        Ok(Self { labels, by_name })
    }

    /// All labels in output-index order.
    pub fn all_labels(&self) -> &[String] {
        &self.labels
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the vocabulary is empty.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// The label at a given output index.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Look up a label's output index by its full name.
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.by_name.get(label).copied()
    }

    /// Text prompt used to embed a label into the SigLIP space.
    ///
    /// Synonym lists keep only the first entry: "a photo of a tench",
    /// not "a photo of a tench, Tinca tinca".
    pub fn prompt_for(label: &str) -> String {
        let head = label.split(',').next().unwrap_or(label).trim();
        format!("a photo of a {}", head)
    }

    /// BLAKE3 hash of all label names in order.
    ///
    /// Keys the label-bank cache — a changed vocabulary changes the
    /// hash and forces a rebuild.
    pub fn content_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for label in &self.labels {
            hasher.update(label.as_bytes());
            hasher.update(b"\n");
        }
        hasher.finalize().to_hex().to_string()
    }
}
