//! Similarity scoring and score fusion.
//!
//! The visual score is the cosine similarity between the image and
//! query embeddings (both unit vectors, so a plain dot product). When
//! the auxiliary classifier is active, each image also gets a
//! label-semantic score — the best similarity between any predicted
//! label's embedding and the query — and the two are blended linearly.

use crate::classify::LabelBank;
use crate::math::dot;

/// Per-image score components.
#[derive(Debug, Clone, Copy)]
pub struct ScoreBreakdown {
    /// Cosine similarity of image and query embeddings
    pub visual: f64,
    /// Label-semantic score, when auxiliary scoring ran
    pub aux: Option<f64>,
    /// The blended score used for ranking
    pub fused: f64,
}

/// Computes fused similarity scores for one query.
pub struct FusionScorer {
    weight: f64,
}

impl FusionScorer {
    /// Create a scorer with the given fusion weight, clamped to [0, 1].
    ///
    /// Weight 0 ranks purely on the visual score; weight 1 purely on
    /// the label-semantic score.
    pub fn new(weight: f64) -> Self {
        Self {
            weight: weight.clamp(0.0, 1.0),
        }
    }

    /// The effective (clamped) fusion weight.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Score one image against the query.
    ///
    /// Embeddings are pre-normalized by the providers; this function
    /// only computes dot products and never re-normalizes. Auxiliary
    /// scoring runs only when both predicted labels and a label bank
    /// are present; otherwise the fused score is the visual score.
    pub fn score(
        &self,
        image_embedding: &[f32],
        query_embedding: &[f32],
        labels: Option<&[String]>,
        label_bank: Option<&LabelBank>,
    ) -> ScoreBreakdown {
        let visual = dot(image_embedding, query_embedding);

        let aux = match (labels, label_bank) {
            (Some(labels), Some(bank)) => {
                Some(label_similarity(labels, bank, query_embedding))
            }
            _ => None,
        };

        let fused = match aux {
            Some(aux) => (1.0 - self.weight) * visual + self.weight * aux,
            None => visual,
        };

        ScoreBreakdown { visual, aux, fused }
    }
}

/// Best similarity between any predicted label and the query.
///
/// A label with no bank entry contributes 0.0 to the max rather than
/// erroring; no labels at all also yields 0.0.
fn label_similarity(labels: &[String], bank: &LabelBank, query_embedding: &[f32]) -> f64 {
    labels
        .iter()
        .map(|label| {
            bank.get(label)
                .map(|emb| dot(emb, query_embedding))
                .unwrap_or(0.0)
        })
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::l2_normalize;

    fn bank(entries: &[(&str, &[f32])]) -> LabelBank {
        let dim = entries[0].1.len();
        LabelBank::from_entries(
            entries
                .iter()
                .map(|(name, v)| (name.to_string(), v.to_vec()))
                .collect(),
            dim,
        )
    }

    #[test]
    fn test_visual_only_when_aux_absent() {
        let scorer = FusionScorer::new(0.3);
        let img = l2_normalize(&[1.0, 2.0, 3.0]);
        let query = l2_normalize(&[1.0, 0.0, 1.0]);

        let b = scorer.score(&img, &query, None, None);
        assert!(b.aux.is_none());
        assert!((b.fused - b.visual).abs() < 1e-12);
    }

    #[test]
    fn test_zero_fusion_weight_matches_visual_only() {
        let scorer = FusionScorer::new(0.0);
        let img = l2_normalize(&[0.2, -0.5, 0.8]);
        let query = l2_normalize(&[0.9, 0.1, 0.3]);
        let labels = vec!["cat".to_string()];
        let b = bank(&[("cat", &[0.0, 1.0, 0.0])]);

        let with_aux = scorer.score(&img, &query, Some(&labels), Some(&b));
        let visual_only = scorer.score(&img, &query, None, None);
        assert!((with_aux.fused - visual_only.fused).abs() < 1e-9);
    }

    #[test]
    fn test_full_fusion_weight_matches_secondary() {
        let scorer = FusionScorer::new(1.0);
        let img = l2_normalize(&[0.2, -0.5, 0.8]);
        let query: Vec<f32> = vec![0.0, 1.0, 0.0];
        let labels = vec!["cat".to_string()];
        let b = bank(&[("cat", &[0.0, 1.0, 0.0])]);

        let breakdown = scorer.score(&img, &query, Some(&labels), Some(&b));
        assert_eq!(breakdown.aux, Some(1.0));
        assert!((breakdown.fused - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_fusion_is_linear_blend() {
        let scorer = FusionScorer::new(0.3);
        let img: Vec<f32> = vec![1.0, 0.0];
        let query: Vec<f32> = vec![1.0, 0.0];
        // visual = 1.0; label "x" has similarity 0.0 against the query
        let labels = vec!["x".to_string()];
        let b = bank(&[("x", &[0.0, 1.0])]);

        let breakdown = scorer.score(&img, &query, Some(&labels), Some(&b));
        assert!((breakdown.fused - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_weight_is_clamped() {
        assert_eq!(FusionScorer::new(2.5).weight(), 1.0);
        assert_eq!(FusionScorer::new(-0.5).weight(), 0.0);
        assert_eq!(FusionScorer::new(0.4).weight(), 0.4);
    }

    #[test]
    fn test_missing_label_contributes_zero_not_error() {
        let query: Vec<f32> = vec![1.0, 0.0];
        let b = bank(&[("known", &[1.0, 0.0])]);
        let labels = vec!["unknown".to_string(), "known".to_string()];

        // "unknown" contributes 0.0; "known" contributes 1.0; max = 1.0
        let sim = label_similarity(&labels, &b, &query);
        assert!((sim - 1.0).abs() < 1e-9);

        // Only unknown labels → secondary score 0.0
        let only_unknown = vec!["unknown".to_string()];
        assert_eq!(label_similarity(&only_unknown, &b, &query), 0.0);
    }

    #[test]
    fn test_empty_label_list_scores_zero() {
        let query: Vec<f32> = vec![1.0, 0.0];
        let b = bank(&[("known", &[1.0, 0.0])]);
        assert_eq!(label_similarity(&[], &b, &query), 0.0);
    }

    #[test]
    fn test_zero_image_vector_scores_zero() {
        let scorer = FusionScorer::new(0.3);
        let zero = vec![0.0f32; 3];
        let query = l2_normalize(&[1.0, 1.0, 1.0]);
        let breakdown = scorer.score(&zero, &query, None, None);
        assert_eq!(breakdown.fused, 0.0);
    }

    #[test]
    fn test_on_topic_image_outranks_off_topic() {
        // Synthetic stand-ins for a "mountain" query against a mountain
        // photo and a cat photo in the shared space.
        let query = l2_normalize(&[1.0, 0.0, 0.0]);
        let mountain = l2_normalize(&[0.9, 0.1, 0.0]);
        let cat = l2_normalize(&[0.0, 0.2, 0.9]);

        let scorer = FusionScorer::new(0.3);
        let m = scorer.score(&mountain, &query, None, None);
        let c = scorer.score(&cat, &query, None, None);
        assert!(m.fused > c.fused);
    }

    #[test]
    fn test_matching_label_lifts_fused_score() {
        let query: Vec<f32> = vec![1.0, 0.0];
        let img = l2_normalize(&[0.5, 0.8]); // middling visual match
        let b = bank(&[("alp", &[1.0, 0.0])]); // label matches the query exactly
        let labels = vec!["alp".to_string()];

        let scorer = FusionScorer::new(0.3);
        let with_labels = scorer.score(&img, &query, Some(&labels), Some(&b));
        let without = scorer.score(&img, &query, None, None);
        assert!(with_labels.fused > without.fused);
    }
}
