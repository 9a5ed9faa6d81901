//! Benchmarks for the scoring and ranking hot path.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use prism_core::classify::LabelBank;
use prism_core::math::l2_normalize;
use prism_core::search::{rank, FusionScorer};

const DIM: usize = 768;

/// Deterministic pseudo-random unit vector (no rand dependency needed).
fn vector(seed: u64) -> Vec<f32> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
    let raw: Vec<f32> = (0..DIM)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((state >> 33) as f32 / u32::MAX as f32) - 0.5
        })
        .collect();
    l2_normalize(&raw)
}

fn bench_visual_scoring(c: &mut Criterion) {
    let query = vector(1);
    let images: Vec<Vec<f32>> = (0..1000).map(|i| vector(i + 2)).collect();
    let scorer = FusionScorer::new(0.0);

    c.bench_function("score_1000_images_visual", |b| {
        b.iter(|| {
            for emb in &images {
                black_box(scorer.score(black_box(emb), &query, None, None));
            }
        })
    });
}

fn bench_fused_scoring(c: &mut Criterion) {
    let query = vector(1);
    let images: Vec<Vec<f32>> = (0..1000).map(|i| vector(i + 2)).collect();
    let bank = LabelBank::from_entries(
        (0..100)
            .map(|i| (format!("label_{i}"), vector(i + 5000)))
            .collect(),
        DIM,
    );
    let labels: Vec<String> = (0..5).map(|i| format!("label_{i}")).collect();
    let scorer = FusionScorer::new(0.3);

    c.bench_function("score_1000_images_fused", |b| {
        b.iter(|| {
            for emb in &images {
                black_box(scorer.score(black_box(emb), &query, Some(&labels), Some(&bank)));
            }
        })
    });
}

fn bench_rank(c: &mut Criterion) {
    let query = vector(1);
    let scorer = FusionScorer::new(0.0);
    let candidates: Vec<_> = (0..1000)
        .map(|i| {
            let emb = vector(i + 2);
            let breakdown = scorer.score(&emb, &query, None, None);
            prism_core::search::ScoredCandidate {
                path: std::path::PathBuf::from(format!("/photos/{i}.jpg")),
                breakdown,
                labels: None,
            }
        })
        .collect();

    c.bench_function("rank_1000_candidates", |b| {
        b.iter(|| black_box(rank(black_box(candidates.clone()), -1.0, 100)))
    });
}

criterion_group!(benches, bench_visual_scoring, bench_fused_scoring, bench_rank);
criterion_main!(benches);
