//! Search orchestration — wires enumeration, decoding, embedding,
//! classification, scoring, and ranking into one call.
//!
//! `SearchEngine::load` is the initializing transition: it loads every
//! configured collaborator up front and fails fatally if any is
//! missing. A loaded engine is ready; `search` may be called any
//! number of times, each call independent. Image embeddings are not
//! cached between calls — every search re-embeds every image.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::classify::{Classifier, LabelBank};
use crate::config::{Config, DecodeErrorPolicy};
use crate::embedding::EmbeddingEngine;
use crate::error::{Result, SearchError};
use crate::pipeline::{ImageDecoder, ImageEnumerator};
use crate::types::{SearchRequest, SearchResponse, SearchStats};

use super::ranker::{rank, ScoredCandidate};
use super::scorer::FusionScorer;

/// The main entry point: a loaded, ready-to-search engine.
pub struct SearchEngine {
    enumerator: ImageEnumerator,
    decoder: ImageDecoder,
    embedder: Arc<EmbeddingEngine>,
    classifier: Option<Arc<Classifier>>,
    embed_batch_size: usize,
    top_k: usize,
    decode_policy: DecodeErrorPolicy,
}

impl SearchEngine {
    /// Load all configured collaborators.
    ///
    /// The embedding engine is always required. The classifier (and its
    /// label bank, encoded on first run) loads only when
    /// `search.use_classifier` is set. Any load failure aborts — there
    /// is no retry and no degraded-init mode.
    pub async fn load(config: &Config) -> Result<Self> {
        let model_dir = config.model_dir();
        let embedding_config = config.embedding.clone();

        let load_dir = model_dir.clone();
        let embedder = tokio::task::spawn_blocking(move || {
            EmbeddingEngine::load(&embedding_config, &load_dir)
        })
        .await
        .map_err(join_error)??;
        let embedder = Arc::new(embedder);

        let classifier = if config.search.use_classifier {
            let classifier_config = config.classifier.clone();
            let bank_dir = config.label_bank_dir();
            let emb = Arc::clone(&embedder);
            let classifier = tokio::task::spawn_blocking(move || {
                Classifier::load(&classifier_config, &model_dir, &bank_dir, &emb)
            })
            .await
            .map_err(join_error)??;
            Some(Arc::new(classifier))
        } else {
            None
        };

        Ok(Self {
            enumerator: ImageEnumerator::new(config.processing.clone()),
            decoder: ImageDecoder::new(config.limits.clone()),
            embedder,
            classifier,
            embed_batch_size: config.processing.embed_batch_size,
            top_k: config.search.top_k,
            decode_policy: config.search.on_decode_error,
        })
    }

    /// Run one search: enumerate, embed, score, rank.
    ///
    /// Errors surface to the caller and discard all partial work — a
    /// failed search never returns a partial result set.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let start = Instant::now();

        let files = self.enumerator.enumerate(&request.image_folder)?;
        let total_images = files.len();
        tracing::info!(
            "Found {} image(s) in {:?} for query {:?}",
            total_images,
            request.image_folder,
            request.query
        );

        if files.is_empty() {
            return Ok(assemble_response(vec![], total_images, request, start));
        }

        let classify = request.use_classifier && self.classifier.is_some();
        if request.use_classifier && self.classifier.is_none() {
            tracing::warn!(
                "Classifier requested but not loaded — ranking on visual score only. \
                 Enable search.use_classifier before loading the engine."
            );
        }

        // Decode and preprocess. Decoded images are retained only when
        // the classifier needs them again.
        let mut tensors = Vec::with_capacity(files.len());
        let mut paths: Vec<PathBuf> = Vec::with_capacity(files.len());
        let mut decoded_images = if classify { Some(Vec::with_capacity(files.len())) } else { None };

        for path in files {
            match self.decoder.decode(&path).await {
                Ok(decoded) => {
                    tensors.push(self.embedder.preprocess(&decoded.image));
                    if let Some(images) = decoded_images.as_mut() {
                        images.push(decoded.image);
                    }
                    paths.push(path);
                }
                Err(e) => match self.decode_policy {
                    DecodeErrorPolicy::Abort => return Err(e.into()),
                    DecodeErrorPolicy::Skip => {
                        tracing::warn!("Skipping undecodable image {:?}: {e}", path);
                    }
                },
            }
        }

        // Batched image embedding — one ONNX call per chunk.
        let mut image_embeddings: Vec<Vec<f32>> = Vec::with_capacity(paths.len());
        let mut offset = 0;
        while offset < tensors.len() {
            let take = (tensors.len() - offset).min(self.embed_batch_size);
            let chunk: Vec<_> = tensors[offset..offset + take].to_vec();
            let chunk_paths: Vec<PathBuf> = paths[offset..offset + take].to_vec();
            let embedder = Arc::clone(&self.embedder);
            let batch = tokio::task::spawn_blocking(move || {
                embedder.embed_preprocessed_batch(&chunk, &chunk_paths)
            })
            .await
            .map_err(join_error)??;
            image_embeddings.extend(batch);
            offset += take;
        }
        drop(tensors);

        // Query embedding.
        let embedder = Arc::clone(&self.embedder);
        let query = request.query.clone();
        let query_embedding = tokio::task::spawn_blocking(move || embedder.embed_text(&query))
            .await
            .map_err(join_error)??;

        // Auxiliary classification, degrading per image inside classify().
        let labels_per_image: Vec<Option<Vec<String>>> =
            match (self.classifier.as_ref().filter(|_| classify), decoded_images) {
                (Some(classifier), Some(images)) => {
                    let classifier = Arc::clone(classifier);
                    let classify_paths = paths.clone();
                    let top_k = self.top_k;
                    tokio::task::spawn_blocking(move || {
                        images
                            .iter()
                            .zip(classify_paths.iter())
                            .map(|(image, path)| Some(classifier.classify(image, path, top_k)))
                            .collect()
                    })
                    .await
                    .map_err(join_error)?
                }
                _ => vec![None; paths.len()],
            };

        // Pure, synchronous tail: score, rank, summarize.
        let scorer = FusionScorer::new(request.fusion_weight);
        let bank = self
            .classifier
            .as_ref()
            .filter(|_| classify)
            .map(|c| c.label_bank());
        let candidates = score_candidates(
            paths,
            image_embeddings,
            labels_per_image,
            &query_embedding,
            &scorer,
            bank,
        );
        let results = rank(candidates, request.threshold, request.max_results);

        Ok(assemble_response(results, total_images, request, start))
    }
}

/// Score every image against the query embedding.
pub(crate) fn score_candidates(
    paths: Vec<PathBuf>,
    embeddings: Vec<Vec<f32>>,
    labels: Vec<Option<Vec<String>>>,
    query_embedding: &[f32],
    scorer: &FusionScorer,
    bank: Option<&LabelBank>,
) -> Vec<ScoredCandidate> {
    paths
        .into_iter()
        .zip(embeddings)
        .zip(labels)
        .map(|((path, embedding), labels)| {
            let breakdown = scorer.score(&embedding, query_embedding, labels.as_deref(), bank);
            ScoredCandidate {
                path,
                breakdown,
                labels,
            }
        })
        .collect()
}

fn assemble_response(
    results: Vec<crate::types::SearchHit>,
    total_images: usize,
    request: &SearchRequest,
    start: Instant,
) -> SearchResponse {
    let stats = SearchStats {
        total_images,
        matching_images: results.len(),
        processing_time_ms: start.elapsed().as_secs_f64() * 1000.0,
        query: request.query.clone(),
    };
    SearchResponse { results, stats }
}

fn join_error(e: tokio::task::JoinError) -> SearchError {
    SearchError::Model {
        message: format!("Blocking task failed: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::l2_normalize;

    #[test]
    fn test_score_candidates_pairs_inputs() {
        let query = l2_normalize(&[1.0, 0.0]);
        let paths = vec![PathBuf::from("/p/a.jpg"), PathBuf::from("/p/b.jpg")];
        let embeddings = vec![l2_normalize(&[1.0, 0.0]), l2_normalize(&[0.0, 1.0])];
        let labels = vec![None, None];
        let scorer = FusionScorer::new(0.3);

        let candidates = score_candidates(paths, embeddings, labels, &query, &scorer, None);
        assert_eq!(candidates.len(), 2);
        assert!((candidates[0].breakdown.fused - 1.0).abs() < 1e-6);
        assert!(candidates[1].breakdown.fused.abs() < 1e-6);
    }

    #[test]
    fn test_score_then_rank_keeps_higher_scorer_under_cap() {
        // Two above-threshold images with max_results = 1: only the
        // better match survives, at rank 1.
        let query = l2_normalize(&[1.0, 0.0]);
        let paths = vec![
            PathBuf::from("/p/good.jpg"),
            PathBuf::from("/p/better.jpg"),
        ];
        let embeddings = vec![
            l2_normalize(&[0.8, 0.6]),
            l2_normalize(&[1.0, 0.1]),
        ];
        let scorer = FusionScorer::new(0.3);

        let candidates =
            score_candidates(paths, embeddings, vec![None, None], &query, &scorer, None);
        let hits = rank(candidates, 0.1, 1);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].file_name, "better.jpg");
        assert_eq!(hits[0].rank, 1);
    }

    #[test]
    fn test_assemble_response_stats() {
        let request = SearchRequest::new("/photos", "a snowy mountain");
        let start = Instant::now();
        let response = assemble_response(vec![], 7, &request, start);
        assert_eq!(response.stats.total_images, 7);
        assert_eq!(response.stats.matching_images, 0);
        assert_eq!(response.stats.query, "a snowy mountain");
        assert!(response.stats.processing_time_ms >= 0.0);
    }
}
