//! Document similarity metrics used to score a generated resume against the
//! candidate's own data and the job posting.
//!
//! Jaccard and overlap work on normalized token sets, cosine on a TF-IDF
//! space fit over the two documents being compared, and the embedding metric
//! on provider vectors of flattened JSON fragments.

use std::sync::Arc;

use crate::text::{default_normalizer, NormalizedTokenSet, TextNormalizer};

pub mod embedding;
pub mod report;
pub mod tfidf;

pub use embedding::{key_value_chunking, vector_embedding_similarity, EmbeddingError};
pub use report::{
    calculate_embedding_metric, calculate_metrics, MetricsReport, SimilarityMetric,
    SimilarityScore,
};

#[derive(Clone)]
pub struct SimilarityScorer {
    normalizer: Arc<TextNormalizer>,
}

impl Default for SimilarityScorer {
    fn default() -> Self {
        Self::new(default_normalizer())
    }
}

impl SimilarityScorer {
    pub fn new(normalizer: Arc<TextNormalizer>) -> Self {
        Self { normalizer }
    }

    fn token_sets(&self, a: &str, b: &str) -> (NormalizedTokenSet, NormalizedTokenSet) {
        (
            self.normalizer.normalize_set(a),
            self.normalizer.normalize_set(b),
        )
    }

    /// |A ∩ B| / |A ∪ B| over normalized tokens; 0.0 when both are empty.
    pub fn jaccard(&self, a: &str, b: &str) -> f64 {
        let (set_a, set_b) = self.token_sets(a, b);
        let union = set_a.union_len(&set_b);
        if union == 0 {
            return 0.0;
        }
        set_a.intersection_len(&set_b) as f64 / union as f64
    }

    /// |A ∩ B| / min(|A|, |B|) over normalized tokens; 0.0 when either is empty.
    pub fn overlap(&self, a: &str, b: &str) -> f64 {
        let (set_a, set_b) = self.token_sets(a, b);
        let smaller = set_a.len().min(set_b.len());
        if smaller == 0 {
            return 0.0;
        }
        set_a.intersection_len(&set_b) as f64 / smaller as f64
    }

    /// TF-IDF cosine with the vocabulary fit on just `a` and `b`.
    pub fn cosine(&self, a: &str, b: &str) -> f64 {
        tfidf::pairwise_cosine(a, b)
    }

    pub fn score(&self, metric: SimilarityMetric, a: &str, b: &str) -> Option<f64> {
        match metric {
            SimilarityMetric::Jaccard => Some(self.jaccard(a, b)),
            SimilarityMetric::Overlap => Some(self.overlap(a, b)),
            SimilarityMetric::Cosine => Some(self.cosine(a, b)),
            SimilarityMetric::Embedding => None,
        }
    }
}

pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    SimilarityScorer::default().jaccard(a, b)
}

pub fn overlap_coefficient(a: &str, b: &str) -> f64 {
    SimilarityScorer::default().overlap(a, b)
}

pub fn cosine_similarity(a: &str, b: &str) -> f64 {
    SimilarityScorer::default().cosine(a, b)
}
