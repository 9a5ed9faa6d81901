//! SigLIP visual encoder session management and inference.
//!
//! Loads a SigLIP vision encoder exported to ONNX format and runs
//! inference to produce 768-dimensional image embedding vectors.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ndarray::Array4;
use ort::session::Session;
use ort::value::Value;

use crate::error::SearchError;

/// Wraps an ONNX Runtime session for SigLIP visual embedding.
///
/// Uses a `Mutex` because `Session::run` requires `&mut self`.
pub struct VisionSession {
    session: Mutex<Session>,
    /// Name of the input tensor (detected from model metadata).
    input_name: String,
}

impl VisionSession {
    /// Load a SigLIP vision encoder from an ONNX file.
    pub fn load(model_path: &Path) -> Result<Self, SearchError> {
        let session = Session::builder()
            .map_err(|e| SearchError::Model {
                message: format!("Failed to create ONNX session builder: {e}"),
            })?
            .commit_from_file(model_path)
            .map_err(|e| SearchError::Model {
                message: format!("Failed to load vision encoder from {model_path:?}: {e}"),
            })?;

        // Detect the input tensor name from model metadata.
        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .unwrap_or_else(|| "pixel_values".to_string());

        tracing::debug!(
            "Loaded vision encoder from {:?} (input: {:?}, outputs: {:?})",
            model_path,
            input_name,
            session
                .outputs()
                .iter()
                .map(|o| o.name())
                .collect::<Vec<_>>()
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
        })
    }

    /// Run batch inference on preprocessed image tensors.
    ///
    /// Each tensor must have shape \[1, 3, image_size, image_size\].
    /// They are stacked into a single \[N, 3, image_size, image_size\]
    /// tensor for one ONNX call. Returns N L2-normalized embeddings.
    pub fn embed_batch(
        &self,
        tensors: &[Array4<f32>],
        paths: &[PathBuf],
    ) -> Result<Vec<Vec<f32>>, SearchError> {
        let batch_size = tensors.len();
        if batch_size == 0 {
            return Ok(vec![]);
        }

        // Validate all tensors have the same shape.
        let shape_0 = tensors[0].shape();
        let single_len = tensors[0].len(); // 3 * H * W
        for (i, t) in tensors.iter().enumerate().skip(1) {
            if t.shape() != shape_0 {
                return Err(SearchError::Embedding {
                    path: paths.get(i).cloned().unwrap_or_default(),
                    message: format!(
                        "Tensor shape mismatch in batch: expected {:?}, got {:?}",
                        shape_0,
                        t.shape()
                    ),
                });
            }
        }

        // Build flat batch tensor [N, 3, H, W].
        let mut flat_data = Vec::with_capacity(batch_size * single_len);
        for t in tensors {
            flat_data.extend(t.iter().copied());
        }
        let batch_shape: Vec<i64> = vec![
            batch_size as i64,
            shape_0[1] as i64, // 3
            shape_0[2] as i64, // H
            shape_0[3] as i64, // W
        ];

        let input_value =
            Value::from_array((batch_shape, flat_data)).map_err(|e| SearchError::Embedding {
                path: paths.first().cloned().unwrap_or_default(),
                message: format!("Failed to create batch input tensor: {e}"),
            })?;

        let inputs = ort::inputs![self.input_name.as_str() => input_value];

        let mut session = self.session.lock().map_err(|e| SearchError::Embedding {
            path: Default::default(),
            message: format!("Session lock poisoned: {e}"),
        })?;

        let outputs = session.run(inputs).map_err(|e| SearchError::Embedding {
            path: paths.first().cloned().unwrap_or_default(),
            message: format!("ONNX batch inference failed: {e}"),
        })?;

        // Extract pooler_output by name — the cross-modal embedding
        // projection. The first output (last_hidden_state) is NOT
        // aligned with the text encoder's space.
        let pooler_output = outputs
            .iter()
            .find(|(name, _)| *name == "pooler_output")
            .ok_or_else(|| SearchError::Embedding {
                path: paths.first().cloned().unwrap_or_default(),
                message: "Model did not produce pooler_output".to_string(),
            })?;

        let (shape, data) =
            pooler_output
                .1
                .try_extract_tensor::<f32>()
                .map_err(|e| SearchError::Embedding {
                    path: paths.first().cloned().unwrap_or_default(),
                    message: format!("Failed to extract pooler_output tensor: {e}"),
                })?;

        // Determine embedding dimension from output shape [N, dim].
        let embedding_dim = match shape.len() {
            1 => data.len() / batch_size,
            2 => shape[1] as usize,
            _ => {
                return Err(SearchError::Embedding {
                    path: paths.first().cloned().unwrap_or_default(),
                    message: format!("Unexpected pooler_output shape: {:?}", shape),
                });
            }
        };

        // Split into per-image embeddings and L2-normalize each.
        let embeddings: Vec<Vec<f32>> = data
            .chunks(embedding_dim)
            .take(batch_size)
            .map(crate::math::l2_normalize)
            .collect();

        Ok(embeddings)
    }

    /// Run inference on a single preprocessed image tensor.
    pub fn embed(
        &self,
        preprocessed: &Array4<f32>,
        path: &Path,
    ) -> Result<Vec<f32>, SearchError> {
        let mut batch = self.embed_batch(
            std::slice::from_ref(preprocessed),
            std::slice::from_ref(&path.to_path_buf()),
        )?;
        batch.pop().ok_or_else(|| SearchError::Embedding {
            path: path.to_path_buf(),
            message: "Vision encoder returned empty result for single input".to_string(),
        })
    }
}
