use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::llm_client::EmbeddingProvider;

use super::embedding::{vector_embedding_similarity, EmbeddingError};
use super::SimilarityScorer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    Jaccard,
    Overlap,
    Cosine,
    Embedding,
}

impl SimilarityMetric {
    pub const LEXICAL: [SimilarityMetric; 3] = [
        SimilarityMetric::Jaccard,
        SimilarityMetric::Overlap,
        SimilarityMetric::Cosine,
    ];

    /// Key used for this metric in a `MetricsReport`.
    pub fn report_key(&self) -> &'static str {
        match self {
            SimilarityMetric::Jaccard => "jaccard_similarity",
            SimilarityMetric::Overlap => "overlap_coefficient",
            SimilarityMetric::Cosine => "cosine_similarity",
            SimilarityMetric::Embedding => "vector_embedding_similarity",
        }
    }
}

/// One metric evaluated over the three document pairs of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityScore {
    /// Generated resume vs. the candidate's own data.
    pub user_personalization: f64,
    /// Generated resume vs. the job details.
    pub job_alignment: f64,
    /// Candidate data vs. the job details.
    pub job_match: f64,
}

/// Scores keyed by metric name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricsReport(BTreeMap<String, SimilarityScore>);

impl MetricsReport {
    pub fn insert(&mut self, metric: SimilarityMetric, score: SimilarityScore) {
        self.0.insert(metric.report_key().to_string(), score);
    }

    pub fn get(&self, metric: SimilarityMetric) -> Option<&SimilarityScore> {
        self.0.get(metric.report_key())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Compact JSON of the three documents, in the order the pairs use them.
struct PairDocuments {
    resume: String,
    user: String,
    job: String,
}

impl PairDocuments {
    fn new(resume: &Value, user: &Value, job: &Value) -> Self {
        Self {
            resume: resume.to_string(),
            user: user.to_string(),
            job: job.to_string(),
        }
    }
}

/// Jaccard, overlap and cosine scores for the resume/user/job triple.
pub fn calculate_metrics(
    scorer: &SimilarityScorer,
    resume: &Value,
    user: &Value,
    job: &Value,
) -> MetricsReport {
    let docs = PairDocuments::new(resume, user, job);
    let mut report = MetricsReport::default();

    for metric in SimilarityMetric::LEXICAL {
        let score = |a: &str, b: &str| scorer.score(metric, a, b).unwrap_or(0.0);
        report.insert(
            metric,
            SimilarityScore {
                user_personalization: score(&docs.resume, &docs.user),
                job_alignment: score(&docs.resume, &docs.job),
                job_match: score(&docs.user, &docs.job),
            },
        );
    }

    report
}

/// Embedding score for the same triple. Provider failures propagate.
pub async fn calculate_embedding_metric(
    provider: &dyn EmbeddingProvider,
    resume: &Value,
    user: &Value,
    job: &Value,
) -> Result<SimilarityScore, EmbeddingError> {
    let docs = PairDocuments::new(resume, user, job);
    Ok(SimilarityScore {
        user_personalization: vector_embedding_similarity(provider, &docs.resume, &docs.user)
            .await?,
        job_alignment: vector_embedding_similarity(provider, &docs.resume, &docs.job).await?,
        job_match: vector_embedding_similarity(provider, &docs.user, &docs.job).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_calculate_metrics_keys() {
        let scorer = SimilarityScorer::default();
        let resume = json!({"skills": ["rust", "kubernetes"]});
        let user = json!({"skills": ["rust", "python"]});
        let job = json!({"keywords": ["rust", "kubernetes"]});

        let report = calculate_metrics(&scorer, &resume, &user, &job);
        let value = serde_json::to_value(&report).unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();

        assert_eq!(
            keys,
            vec!["cosine_similarity", "jaccard_similarity", "overlap_coefficient"]
        );
        assert!(value["jaccard_similarity"]["job_alignment"].is_number());
    }

    #[test]
    fn test_identical_documents_score_one() {
        let scorer = SimilarityScorer::default();
        let doc = json!({"summary": "Rust engineer shipping distributed systems"});
        let report = calculate_metrics(&scorer, &doc, &doc, &doc);
        let jaccard = report.get(SimilarityMetric::Jaccard).unwrap();
        assert_eq!(jaccard.user_personalization, 1.0);
        assert_eq!(jaccard.job_alignment, 1.0);
        assert_eq!(jaccard.job_match, 1.0);
    }

    #[test]
    fn test_pair_assignment() {
        let scorer = SimilarityScorer::default();
        let resume = json!("rust");
        let user = json!("rust");
        let job = json!("cobol");
        let report = calculate_metrics(&scorer, &resume, &user, &job);
        let overlap = report.get(SimilarityMetric::Overlap).unwrap();
        assert_eq!(overlap.user_personalization, 1.0);
        assert_eq!(overlap.job_alignment, 0.0);
        assert_eq!(overlap.job_match, 0.0);
    }
}
