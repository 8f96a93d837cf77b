//! Minimal TF-IDF vectorizer for pairwise document comparison.
//!
//! Tokenization lowercases the text and takes runs of two or more word
//! characters. IDF is smoothed as `ln((1 + n) / (1 + df)) + 1` and every
//! vector is L2-normalized, so the cosine of two vectors is their dot product.

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;

static TERM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("term pattern is valid"));

fn terms(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TERM_RE
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

fn term_counts(text: &str) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for term in terms(text) {
        *counts.entry(term).or_insert(0) += 1;
    }
    counts
}

#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Learns the vocabulary and document frequencies from `corpus`.
    pub fn fit(corpus: &[&str]) -> Self {
        let counts: Vec<HashMap<String, usize>> = corpus.iter().map(|d| term_counts(d)).collect();

        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
        for doc in &counts {
            for term in doc.keys() {
                *document_frequency.entry(term.clone()).or_insert(0) += 1;
            }
        }

        let n = corpus.len() as f64;
        let mut vocabulary = BTreeMap::new();
        let mut idf = Vec::with_capacity(document_frequency.len());
        for (index, (term, df)) in document_frequency.into_iter().enumerate() {
            idf.push(((1.0 + n) / (1.0 + df as f64)).ln() + 1.0);
            vocabulary.insert(term, index);
        }

        Self { vocabulary, idf }
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// L2-normalized TF-IDF vector of `text` over the fitted vocabulary.
    /// Terms outside the vocabulary are ignored; an all-zero vector stays zero.
    pub fn transform(&self, text: &str) -> Vec<f64> {
        let mut vector = vec![0.0; self.vocabulary.len()];
        for (term, count) in term_counts(text) {
            if let Some(&index) = self.vocabulary.get(&term) {
                vector[index] = count as f64 * self.idf[index];
            }
        }

        let norm = vector.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

/// Dot product of two equal-length vectors; 0 when either is all zeros.
pub fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// TF-IDF cosine similarity of two texts, fitting the vocabulary on the pair.
/// Returns 0.0 when neither text has a usable term.
pub fn pairwise_cosine(a: &str, b: &str) -> f64 {
    let vectorizer = TfidfVectorizer::fit(&[a, b]);
    if vectorizer.vocabulary_len() == 0 {
        return 0.0;
    }
    let va = vectorizer.transform(a);
    let vb = vectorizer.transform(b);
    cosine(&va, &vb).clamp(0.0, 1.0)
}
