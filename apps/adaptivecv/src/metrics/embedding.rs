//! Embedding-based similarity between two JSON documents.
//!
//! Each document is flattened into `"path: value"` fragments, every fragment
//! is embedded, and the score is the mean cosine similarity over all
//! fragment pairs.

use serde_json::Value;
use thiserror::Error;

use crate::llm_client::{EmbeddingProvider, LlmError};

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("document is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("document has no key/value fragments to embed")]
    NoFragments,

    #[error("embedding provider failed: {0}")]
    Provider(#[from] LlmError),
}

/// Flattens a JSON value into `"path: value"` fragments.
///
/// Object keys followed by a nested object get a `.` separator, array items
/// are suffixed `_<index>`, and nulls are skipped.
pub fn key_value_chunking(data: &Value) -> Vec<String> {
    let mut fragments = Vec::new();
    chunk_into(data, "", &mut fragments);
    fragments
}

fn chunk_into(data: &Value, prefix: &str, out: &mut Vec<String>) {
    match data {
        Value::Null => {}
        Value::Object(map) => {
            for (key, value) in map {
                if value.is_null() {
                    continue;
                }
                chunk_into(value, &format!("{prefix}{key}{}", separator(value)), out);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                if value.is_null() {
                    continue;
                }
                chunk_into(value, &format!("{prefix}_{index}{}", separator(value)), out);
            }
        }
        Value::String(s) => out.push(format!("{prefix}: {s}")),
        scalar => out.push(format!("{prefix}: {scalar}")),
    }
}

fn separator(child: &Value) -> &'static str {
    if child.is_object() {
        "."
    } else {
        ""
    }
}

fn cosine_f32(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Mean of the pairwise cosine matrix between two sets of vectors.
pub fn mean_pairwise_cosine(left: &[Vec<f32>], right: &[Vec<f32>]) -> f64 {
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    let total: f64 = left
        .iter()
        .flat_map(|a| right.iter().map(move |b| cosine_f32(a, b)))
        .sum();
    total / (left.len() * right.len()) as f64
}

/// Embedding similarity of two JSON-encoded documents.
pub async fn vector_embedding_similarity(
    provider: &dyn EmbeddingProvider,
    doc1: &str,
    doc2: &str,
) -> Result<f64, EmbeddingError> {
    let left = key_value_chunking(&serde_json::from_str(doc1)?);
    let right = key_value_chunking(&serde_json::from_str(doc2)?);
    if left.is_empty() || right.is_empty() {
        return Err(EmbeddingError::NoFragments);
    }

    let left = provider.embed(&left).await?;
    let right = provider.embed(&right).await?;
    Ok(mean_pairwise_cosine(&left, &right))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    #[test]
    fn test_chunking_nested_object() {
        let data = json!({"a": {"b": 1}, "c": "x"});
        assert_eq!(key_value_chunking(&data), vec!["a.b: 1", "c: x"]);
    }

    #[test]
    fn test_chunking_lists_and_nulls() {
        let data = json!({
            "skills": ["rust", null, "go"],
            "projects": [{"name": "crate"}],
            "missing": null
        });
        assert_eq!(
            key_value_chunking(&data),
            vec!["skills_0: rust", "skills_2: go", "projects_0.name: crate"]
        );
    }

    #[test]
    fn test_chunking_scalars() {
        let data = json!({"remote": true, "years": 3.5});
        assert_eq!(key_value_chunking(&data), vec!["remote: true", "years: 3.5"]);
    }

    #[test]
    fn test_chunking_empty() {
        assert!(key_value_chunking(&json!({})).is_empty());
        assert!(key_value_chunking(&Value::Null).is_empty());
    }

    #[test]
    fn test_mean_pairwise_cosine() {
        let left = vec![vec![1.0, 0.0]];
        let right = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        assert!((mean_pairwise_cosine(&left, &right) - 0.5).abs() < 1e-9);
        assert_eq!(mean_pairwise_cosine(&[vec![0.0, 0.0]], &left), 0.0);
    }

    /// Embeds each fragment by whether it mentions "rust".
    struct KeywordEmbedder;

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedder {
        async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
            Ok(inputs
                .iter()
                .map(|s| {
                    if s.contains("rust") {
                        vec![1.0, 0.0]
                    } else {
                        vec![0.0, 1.0]
                    }
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn test_vector_embedding_similarity() {
        let score = vector_embedding_similarity(
            &KeywordEmbedder,
            r#"{"skill": "rust"}"#,
            r#"{"skills": ["rust", "go"]}"#,
        )
        .await
        .unwrap();
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_vector_embedding_similarity_no_fragments() {
        let err = vector_embedding_similarity(&KeywordEmbedder, "{}", r#"{"a": "b"}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, EmbeddingError::NoFragments));
    }

    #[tokio::test]
    async fn test_vector_embedding_similarity_invalid_json() {
        let err = vector_embedding_similarity(&KeywordEmbedder, "not json", "{}")
            .await
            .unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidJson(_)));
    }
}
