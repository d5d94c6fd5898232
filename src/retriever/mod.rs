// Similarity retriever module
// Answers "what stored snippets look like this query?" as a prose summary
// suitable for prompt augmentation


use itertools::Itertools;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::embeddings::EmbeddingClient;
use crate::index::{QueryResult, VectorIndex};

/// Fixed label prefixing every retrieval summary.
pub const SIMILAR_QUERIES_LABEL: &str = "Previously stored snippets similar to the current context:";

const QUERY_LIMIT: usize = 3;

/// Wraps the vector index and the embedding client to produce a
/// human-readable summary of the most similar stored snippets.
pub struct SimilarityRetriever {
    index: Arc<Mutex<VectorIndex>>,
    embedder: EmbeddingClient,
}

impl SimilarityRetriever {
    #[inline]
    pub fn new(index: Arc<Mutex<VectorIndex>>, embedder: EmbeddingClient) -> Self {
        Self { index, embedder }
    }

    /// Summarize the stored snippets most similar to `query`. Never fails:
    /// an unavailable embedding or index yields the label alone.
    #[inline]
    pub fn get_similar_queries(&self, query: &str, min_score: f32) -> String {
        let embedding = self.embedder.embed(&query.to_lowercase());
        if embedding.is_empty() {
            debug!("Embedding unavailable, returning empty retrieval summary");
            return SIMILAR_QUERIES_LABEL.to_string();
        }

        let results = {
            let index = match self.index.lock() {
                Ok(index) => index,
                Err(poisoned) => poisoned.into_inner(),
            };
            match index.query(&embedding, QUERY_LIMIT) {
                Ok(results) => results,
                Err(e) => {
                    warn!("Similarity query failed: {}", e);
                    Vec::new()
                }
            }
        };

        format_similar(&results, min_score)
    }
}

/// Threshold, deduplicate, and format query results into the labeled
/// summary. Scores are normalized to their absolute value and rounded to
/// two decimal places before thresholding; results sharing an exact raw
/// score with an already-kept result are dropped.
pub(crate) fn format_similar(results: &[QueryResult], min_score: f32) -> String {
    let mut seen_scores: HashSet<u32> = HashSet::new();

    let kept = results
        .iter()
        .filter(|result| {
            let rounded = (result.score.abs() * 100.0).round() / 100.0;
            rounded >= min_score && seen_scores.insert(result.score.to_bits())
        })
        .map(|result| {
            format!(
                "{} (from {})",
                result.item.metadata.content, result.item.metadata.file_path
            )
        })
        .join("\n");

    if kept.is_empty() {
        SIMILAR_QUERIES_LABEL.to_string()
    } else {
        format!("{}\n{}", SIMILAR_QUERIES_LABEL, kept)
    }
}
