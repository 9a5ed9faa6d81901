//! MobileNetV2 ONNX session for image classification.

use std::path::Path;
use std::sync::Mutex;

use ndarray::Array4;
use ort::session::Session;
use ort::value::Value;

use crate::error::SearchError;

/// Wraps an ONNX Runtime session for the auxiliary classifier.
///
/// Same `Mutex<Session>` pattern as the embedding encoders.
pub struct ClassifierSession {
    session: Mutex<Session>,
    input_name: String,
}

impl ClassifierSession {
    /// Load the classifier from an ONNX file.
    pub fn load(model_path: &Path) -> Result<Self, SearchError> {
        let session = Session::builder()
            .map_err(|e| SearchError::Model {
                message: format!("Failed to create ONNX session builder: {e}"),
            })?
            .commit_from_file(model_path)
            .map_err(|e| SearchError::Model {
                message: format!("Failed to load classifier from {model_path:?}: {e}"),
            })?;

        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .unwrap_or_else(|| "pixel_values".to_string());

        tracing::debug!(
            "Loaded classifier from {:?} (input: {:?})",
            model_path,
            input_name
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
        })
    }

    /// Run inference on a preprocessed image tensor, returning the raw
    /// logits (one per vocabulary label).
    pub fn logits(&self, preprocessed: &Array4<f32>) -> Result<Vec<f32>, SearchError> {
        let shape: Vec<i64> = preprocessed.shape().iter().map(|&d| d as i64).collect();
        let flat_data: Vec<f32> = preprocessed.iter().copied().collect();

        let input_value =
            Value::from_array((shape, flat_data)).map_err(|e| SearchError::Model {
                message: format!("Failed to create classifier input tensor: {e}"),
            })?;

        let inputs = ort::inputs![self.input_name.as_str() => input_value];

        let mut session = self.session.lock().map_err(|e| SearchError::Model {
            message: format!("Classifier lock poisoned: {e}"),
        })?;

        let outputs = session.run(inputs).map_err(|e| SearchError::Model {
            message: format!("Classifier inference failed: {e}"),
        })?;

        // Single-output model: take the first output as [1, N] logits.
        let first = outputs.iter().next().ok_or_else(|| SearchError::Model {
            message: "Classifier produced no outputs".to_string(),
        })?;

        let (_shape, data) = first
            .1
            .try_extract_tensor::<f32>()
            .map_err(|e| SearchError::Model {
                message: format!("Failed to extract classifier logits: {e}"),
            })?;

        Ok(data.to_vec())
    }
}

/// Softmax over a logit slice.
///
/// Subtracts the max first so large logits don't overflow `exp`.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum > 0.0 {
        exps.iter().map(|&e| e / sum).collect()
    } else {
        vec![0.0; logits.len()]
    }
}

/// Indices of the `k` largest probabilities, descending.
pub fn top_k_indices(probs: &[f32], k: usize) -> Vec<usize> {
    let mut indexed: Vec<(usize, f32)> = probs.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    indexed.truncate(k);
    indexed.into_iter().map(|(i, _)| i).collect()
}
