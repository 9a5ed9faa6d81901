//! Threshold filtering, sorting, and rank assignment.

use std::path::PathBuf;

use crate::types::SearchHit;

use super::scorer::ScoreBreakdown;

/// A scored image awaiting ranking.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub path: PathBuf,
    pub breakdown: ScoreBreakdown,
    pub labels: Option<Vec<String>>,
}

/// Filter, sort, truncate, and assign ranks.
///
/// Candidates scoring below `threshold` are dropped (a score equal to
/// the threshold is kept); the rest are sorted descending by fused
/// score with a stable sort, so ties keep their enumeration order and
/// repeated runs over identical scores are deterministic. The first
/// `max_results` survivors get 1-based contiguous ranks.
pub fn rank(
    candidates: Vec<ScoredCandidate>,
    threshold: f64,
    max_results: usize,
) -> Vec<SearchHit> {
    let mut kept: Vec<ScoredCandidate> = candidates
        .into_iter()
        .filter(|c| c.breakdown.fused >= threshold)
        .collect();

    // Stable: ties preserve enumeration order.
    kept.sort_by(|a, b| {
        b.breakdown
            .fused
            .partial_cmp(&a.breakdown.fused)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    kept.truncate(max_results);

    kept.into_iter()
        .enumerate()
        .map(|(i, c)| {
            let file_name = c
                .path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown")
                .to_string();
            SearchHit {
                image_path: c.path,
                file_name,
                rank: (i + 1) as u32,
                similarity: c.breakdown.fused,
                visual_score: Some(c.breakdown.visual),
                aux_score: c.breakdown.aux,
                predicted_labels: c.labels,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, fused: f64) -> ScoredCandidate {
        ScoredCandidate {
            path: PathBuf::from(format!("/photos/{name}")),
            breakdown: ScoreBreakdown {
                visual: fused,
                aux: None,
                fused,
            },
            labels: None,
        }
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let hits = rank(
            vec![candidate("keep.jpg", 0.3), candidate("drop.jpg", 0.29)],
            0.3,
            100,
        );
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].file_name, "keep.jpg");
    }

    #[test]
    fn test_all_results_meet_threshold() {
        let candidates: Vec<_> = (0..20)
            .map(|i| candidate(&format!("{i}.jpg"), i as f64 / 20.0))
            .collect();
        let hits = rank(candidates, 0.5, 100);
        assert!(hits.iter().all(|h| h.similarity >= 0.5));
    }

    #[test]
    fn test_sorted_descending_with_contiguous_ranks() {
        let hits = rank(
            vec![
                candidate("low.jpg", 0.4),
                candidate("high.jpg", 0.9),
                candidate("mid.jpg", 0.6),
            ],
            0.0,
            100,
        );
        assert_eq!(hits[0].file_name, "high.jpg");
        assert_eq!(hits[1].file_name, "mid.jpg");
        assert_eq!(hits[2].file_name, "low.jpg");
        for (i, hit) in hits.iter().enumerate() {
            assert_eq!(hit.rank, (i + 1) as u32);
        }
        for pair in hits.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
    }

    #[test]
    fn test_ties_keep_enumeration_order() {
        let hits = rank(
            vec![
                candidate("first.jpg", 0.5),
                candidate("second.jpg", 0.5),
                candidate("third.jpg", 0.5),
            ],
            0.0,
            100,
        );
        let names: Vec<&str> = hits.iter().map(|h| h.file_name.as_str()).collect();
        assert_eq!(names, vec!["first.jpg", "second.jpg", "third.jpg"]);
    }

    #[test]
    fn test_truncates_to_max_results() {
        let hits = rank(
            vec![candidate("a.jpg", 0.8), candidate("b.jpg", 0.9)],
            0.1,
            1,
        );
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].file_name, "b.jpg");
        assert_eq!(hits[0].rank, 1);
    }

    #[test]
    fn test_empty_input_empty_output() {
        let hits = rank(vec![], 0.3, 100);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_breakdown_carried_into_hit() {
        let c = ScoredCandidate {
            path: PathBuf::from("/photos/alp.jpg"),
            breakdown: ScoreBreakdown {
                visual: 0.6,
                aux: Some(0.8),
                fused: 0.66,
            },
            labels: Some(vec!["alp".to_string()]),
        };
        let hits = rank(vec![c], 0.0, 10);
        assert_eq!(hits[0].visual_score, Some(0.6));
        assert_eq!(hits[0].aux_score, Some(0.8));
        assert_eq!(hits[0].predicted_labels.as_deref(), Some(&["alp".to_string()][..]));
    }
}
