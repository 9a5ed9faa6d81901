//! Pre-computed label embeddings for fast secondary scoring.
//!
//! The label bank stores a flat N×768 matrix of text embeddings (one
//! per classifier label) plus a name index, so a predicted label can be
//! dot-producted against the query embedding without re-encoding.
//! Built once at engine load, immutable afterwards.

use std::collections::HashMap;
use std::path::Path;

use crate::embedding::EmbeddingEngine;
use crate::error::SearchError;

use super::labels::LabelVocabulary;

/// Pre-computed label → embedding table.
#[derive(Debug)]
pub struct LabelBank {
    /// Flat matrix: N × dim stored row-major.
    matrix: Vec<f32>,
    embedding_dim: usize,
    by_label: HashMap<String, usize>,
}

impl LabelBank {
    /// Encode every vocabulary label and build the bank.
    ///
    /// Uses the "a photo of a {label}" prompt template and batches many
    /// labels per ONNX inference call. Slow on first run; callers cache
    /// the result with [`LabelBank::save`].
    pub fn encode_all(
        vocabulary: &LabelVocabulary,
        embedder: &EmbeddingEngine,
        batch_size: usize,
    ) -> Result<Self, SearchError> {
        let labels = vocabulary.all_labels();
        let embedding_dim = 768;
        let mut matrix: Vec<f32> = Vec::with_capacity(labels.len() * embedding_dim);

        tracing::info!(
            "Encoding {} classifier labels (one-time, cached for later runs)...",
            labels.len()
        );

        let prompts: Vec<String> = labels
            .iter()
            .map(|l| LabelVocabulary::prompt_for(l))
            .collect();

        for chunk in prompts.chunks(batch_size) {
            let embeddings = embedder.embed_text_batch(chunk)?;
            for emb in &embeddings {
                matrix.extend_from_slice(emb);
            }
        }

        let bank = Self {
            matrix,
            embedding_dim,
            by_label: Self::index_labels(labels),
        };

        tracing::info!(
            "Label bank ready: {} labels x {} dims ({:.1} MB)",
            bank.len(),
            embedding_dim,
            (bank.len() * embedding_dim * 4) as f64 / 1_000_000.0
        );

        Ok(bank)
    }

    /// Build a bank directly from (label, embedding) pairs.
    ///
    /// Used by tests and by callers that already hold embeddings.
    pub fn from_entries(entries: Vec<(String, Vec<f32>)>, embedding_dim: usize) -> Self {
        let mut matrix = Vec::with_capacity(entries.len() * embedding_dim);
        let mut by_label = HashMap::with_capacity(entries.len());
        for (i, (label, emb)) in entries.into_iter().enumerate() {
            assert_eq!(
                emb.len(),
                embedding_dim,
                "embedding for {label:?} has wrong dimension"
            );
            matrix.extend_from_slice(&emb);
            by_label.insert(label, i);
        }
        Self {
            matrix,
            embedding_dim,
            by_label,
        }
    }

    /// Look up the embedding for a label string.
    pub fn get(&self, label: &str) -> Option<&[f32]> {
        self.by_label.get(label).map(|&i| {
            let offset = i * self.embedding_dim;
            &self.matrix[offset..offset + self.embedding_dim]
        })
    }

    /// Number of labels in the bank.
    pub fn len(&self) -> usize {
        self.by_label.len()
    }

    /// Whether the bank is empty.
    pub fn is_empty(&self) -> bool {
        self.by_label.is_empty()
    }

    /// The embedding dimension.
    pub fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    /// Save the bank to disk as raw f32 binary for fast reload.
    ///
    /// Also writes a `.meta` sidecar with the vocabulary hash for cache
    /// invalidation.
    pub fn save(&self, path: &Path, vocab_hash: &str) -> Result<(), SearchError> {
        let bytes: Vec<u8> = self.matrix.iter().flat_map(|f| f.to_le_bytes()).collect();
        std::fs::write(path, &bytes).map_err(|e| SearchError::Model {
            message: format!("Failed to save label bank to {:?}: {}", path, e),
        })?;

        let meta_path = path.with_extension("meta");
        let meta = format!(
            "vocab_hash={}\nlabel_count={}\nembedding_dim={}\n",
            vocab_hash,
            self.len(),
            self.embedding_dim
        );
        std::fs::write(&meta_path, meta).map_err(|e| SearchError::Model {
            message: format!("Failed to save label bank metadata to {:?}: {}", meta_path, e),
        })?;

        tracing::info!(
            "Saved label bank to {:?} ({:.1} MB)",
            path,
            bytes.len() as f64 / 1_000_000.0
        );
        Ok(())
    }

    /// Load a bank from a raw f32 binary file.
    ///
    /// Rows are matched to `vocabulary` in output-index order, so the
    /// file must have been saved against the same vocabulary (callers
    /// check [`LabelBank::cache_valid`] first).
    pub fn load(path: &Path, vocabulary: &LabelVocabulary) -> Result<Self, SearchError> {
        let embedding_dim = 768;
        let expected_len = vocabulary.len() * embedding_dim * 4; // 4 bytes per f32

        let bytes = std::fs::read(path).map_err(|e| SearchError::Model {
            message: format!("Failed to read label bank from {:?}: {}", path, e),
        })?;

        if bytes.len() != expected_len {
            return Err(SearchError::Model {
                message: format!(
                    "Label bank size mismatch: expected {} bytes ({} labels), got {} bytes",
                    expected_len,
                    vocabulary.len(),
                    bytes.len()
                ),
            });
        }

        let matrix: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        tracing::info!("Loaded label bank: {} labels from {:?}", vocabulary.len(), path);

        Ok(Self {
            matrix,
            embedding_dim,
            by_label: Self::index_labels(vocabulary.all_labels()),
        })
    }

    /// Check if a cached bank's vocabulary hash matches the current
    /// vocabulary. Returns `true` if the cache is valid.
    pub fn cache_valid(path: &Path, vocab_hash: &str) -> bool {
        let meta_path = path.with_extension("meta");
        let Ok(content) = std::fs::read_to_string(&meta_path) else {
            return false;
        };
        content
            .lines()
            .any(|line| line == format!("vocab_hash={}", vocab_hash))
    }

    fn index_labels(labels: &[String]) -> HashMap<String, usize> {
        labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), i))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(dim: usize, hot: usize) -> Vec<f32> {
        let mut v = vec![0.0; dim];
        v[hot] = 1.0;
        v
    }

    #[test]
    fn test_from_entries_lookup() {
        let bank = LabelBank::from_entries(
            vec![
                ("cat".to_string(), unit(4, 0)),
                ("dog".to_string(), unit(4, 1)),
            ],
            4,
        );
        assert_eq!(bank.len(), 2);
        assert_eq!(bank.get("cat").unwrap(), &[1.0, 0.0, 0.0, 0.0]);
        assert_eq!(bank.get("dog").unwrap(), &[0.0, 1.0, 0.0, 0.0]);
        assert!(bank.get("wolf").is_none());
    }

    #[test]
    #[should_panic(expected = "wrong dimension")]
    fn test_from_entries_rejects_dimension_mismatch() {
        LabelBank::from_entries(vec![("cat".to_string(), vec![1.0, 0.0])], 4);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let bank_path = dir.path().join("labels.bank");

        // Vocabulary fixture via config.json
        let config_path = dir.path().join("config.json");
        std::fs::write(
            &config_path,
            r#"{"id2label": {"0": "cat", "1": "dog"}}"#,
        )
        .unwrap();
        let vocab = LabelVocabulary::load(&config_path).unwrap();

        let entries: Vec<(String, Vec<f32>)> = vocab
            .all_labels()
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), unit(768, i)))
            .collect();
        let bank = LabelBank::from_entries(entries, 768);

        let hash = vocab.content_hash();
        bank.save(&bank_path, &hash).unwrap();
        assert!(LabelBank::cache_valid(&bank_path, &hash));
        assert!(!LabelBank::cache_valid(&bank_path, "different-hash"));

        let loaded = LabelBank::load(&bank_path, &vocab).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get("cat").unwrap()[0], 1.0);
        assert_eq!(loaded.get("dog").unwrap()[1], 1.0);
    }

    #[test]
    fn test_load_rejects_size_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let bank_path = dir.path().join("labels.bank");
        std::fs::write(&bank_path, vec![0u8; 16]).unwrap();

        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, r#"{"id2label": {"0": "cat"}}"#).unwrap();
        let vocab = LabelVocabulary::load(&config_path).unwrap();

        let err = LabelBank::load(&bank_path, &vocab).unwrap_err();
        assert!(err.to_string().contains("size mismatch"));
    }
}
