//! Tokenize → strip → lowercase → stop-word filter → stem, memoized.
//!
//! The normalizer is shared by every similarity computation. Results are
//! kept in a bounded LRU cache keyed by the raw input text, so repeated
//! comparisons against the same resume or job description are cheap.

use std::collections::{BTreeSet, HashSet};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lru::LruCache;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};

use super::stopwords;

pub const DEFAULT_CACHE_CAPACITY: usize = 128;

/// Clitics split off a word before stripping, so `don't` yields `do` + `n't`
/// rather than `dont`.
const CONTRACTIONS: &[&str] = &["n't", "'s", "'re", "'ve", "'ll", "'d", "'m"];

/// Word tokens, keeping inner hyphens and apostrophes attached (`don't`, `e-mail`).
/// Contractions are split afterwards.
static WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\w+(?:[-']\w+)*").expect("word pattern is valid"));

static DEFAULT_NORMALIZER: Lazy<Arc<TextNormalizer>> =
    Lazy::new(|| Arc::new(TextNormalizer::new(NormalizerConfig::english())));

/// Process-wide normalizer with the English configuration and default cache size.
pub fn default_normalizer() -> Arc<TextNormalizer> {
    Arc::clone(&DEFAULT_NORMALIZER)
}

/// Language resources for a `TextNormalizer`.
pub struct NormalizerConfig {
    pub stop_words: HashSet<String>,
    pub algorithm: Algorithm,
    pub cache_capacity: NonZeroUsize,
}

impl NormalizerConfig {
    pub fn english() -> Self {
        Self {
            stop_words: stopwords::ENGLISH.iter().map(|w| w.to_string()).collect(),
            algorithm: Algorithm::English,
            cache_capacity: NonZeroUsize::new(DEFAULT_CACHE_CAPACITY)
                .unwrap_or(NonZeroUsize::MIN),
        }
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        self
    }
}

pub struct TextNormalizer {
    stop_words: HashSet<String>,
    stemmer: Stemmer,
    cache: Mutex<LruCache<String, Arc<[String]>>>,
}

impl TextNormalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self {
            stop_words: config.stop_words,
            stemmer: Stemmer::create(config.algorithm),
            cache: Mutex::new(LruCache::new(config.cache_capacity)),
        }
    }

    /// Normalized tokens of `text`, in input order, duplicates kept.
    ///
    /// Cached by exact input text. The returned slice is shared with the
    /// cache and never mutated.
    pub fn normalize(&self, text: &str) -> Arc<[String]> {
        if let Some(hit) = self.lock_cache().get(text) {
            return Arc::clone(hit);
        }

        let tokens: Arc<[String]> = self.normalize_uncached(text).into();
        self.lock_cache()
            .put(text.to_string(), Arc::clone(&tokens));
        tokens
    }

    /// Distinct normalized tokens of `text`.
    pub fn normalize_set(&self, text: &str) -> NormalizedTokenSet {
        NormalizedTokenSet(self.normalize(text).iter().cloned().collect())
    }

    pub fn cached_entries(&self) -> usize {
        self.lock_cache().len()
    }

    fn normalize_uncached(&self, text: &str) -> Vec<String> {
        WORD_RE
            .find_iter(text)
            .flat_map(|m| split_contraction(m.as_str()))
            .filter_map(|word| {
                let stripped: String = word
                    .chars()
                    .filter(char::is_ascii_alphabetic)
                    .map(|c| c.to_ascii_lowercase())
                    .collect();
                if stripped.is_empty() || self.stop_words.contains(&stripped) {
                    None
                } else {
                    Some(self.stemmer.stem(&stripped).into_owned())
                }
            })
            .collect()
    }

    // A panic while holding the lock leaves the cache consistent (get/put are
    // atomic from our side), so a poisoned mutex is still usable.
    fn lock_cache(&self) -> MutexGuard<'_, LruCache<String, Arc<[String]>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn split_contraction(word: &str) -> impl Iterator<Item = &str> {
    let split = CONTRACTIONS.iter().find_map(|suffix| {
        let at = word.len().checked_sub(suffix.len()).filter(|&at| at > 0)?;
        word.get(at..)
            .filter(|tail| tail.eq_ignore_ascii_case(suffix))
            .map(|_| word.split_at(at))
    });
    match split {
        Some((head, clitic)) => [Some(head), Some(clitic)],
        None => [Some(word), None],
    }
    .into_iter()
    .flatten()
}

/// Set of distinct normalized tokens; the unit of comparison for the
/// set-based similarity metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedTokenSet(BTreeSet<String>);

impl NormalizedTokenSet {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.contains(token)
    }

    pub fn intersection_len(&self, other: &NormalizedTokenSet) -> usize {
        self.0.intersection(&other.0).count()
    }

    pub fn union_len(&self, other: &NormalizedTokenSet) -> usize {
        self.0.union(&other.0).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> TextNormalizer {
        TextNormalizer::new(NormalizerConfig::english())
    }

    #[test]
    fn test_normalize_drops_stop_words_and_stems() {
        let tokens = normalizer().normalize("The quick brown fox");
        assert_eq!(&*tokens, &["quick", "brown", "fox"]);
    }

    #[test]
    fn test_normalize_stems_inflections() {
        let tokens = normalizer().normalize("Running engineers deployed");
        assert_eq!(&*tokens, &["run", "engin", "deploy"]);
    }

    #[test]
    fn test_normalize_strips_non_letters() {
        let tokens = normalizer().normalize("C++ 2024 node.js");
        // "C" is kept as a single-letter token, "2024" strips to nothing.
        assert_eq!(&*tokens, &["c", "node", "js"]);
    }

    #[test]
    fn test_normalize_splits_contractions() {
        let n = normalizer();
        assert_eq!(&*n.normalize("I don't like it"), &["nt", "like"]);
        assert_eq!(&*n.normalize("Jordan's team"), &["jordan", "team"]);
        assert_eq!(&*n.normalize("We're shipping, they'll review"), &["ship", "review"]);
        assert!(!n.normalize("DON'T").contains(&"dont".to_string()));
    }

    #[test]
    fn test_split_contraction_keeps_plain_words() {
        assert_eq!(split_contraction("e-mail").collect::<Vec<_>>(), vec!["e-mail"]);
        assert_eq!(split_contraction("can't").collect::<Vec<_>>(), vec!["ca", "n't"]);
        assert_eq!(split_contraction("'s").collect::<Vec<_>>(), vec!["'s"]);
    }

    #[test]
    fn test_normalize_empty_text() {
        assert!(normalizer().normalize("").is_empty());
        assert!(normalizer().normalize("   \n").is_empty());
    }

    #[test]
    fn test_normalize_only_stop_words() {
        assert!(normalizer().normalize("the and of to").is_empty());
    }

    #[test]
    fn test_normalize_is_deterministic_and_cached() {
        let n = normalizer();
        let first = n.normalize("Distributed systems engineer");
        let second = n.normalize("Distributed systems engineer");
        assert_eq!(first, second);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(n.cached_entries(), 1);
    }

    #[test]
    fn test_cache_is_bounded() {
        let n = TextNormalizer::new(NormalizerConfig::english().with_cache_capacity(2));
        n.normalize("alpha");
        n.normalize("beta");
        n.normalize("gamma");
        assert_eq!(n.cached_entries(), 2);
    }

    #[test]
    fn test_normalize_set_deduplicates() {
        let set = normalizer().normalize_set("rust Rust RUST tooling");
        assert_eq!(set.len(), 2);
        assert!(set.contains("rust"));
        assert!(set.contains("tool"));
    }

    #[test]
    fn test_set_operations() {
        let n = normalizer();
        let a = n.normalize_set("quick brown fox");
        let b = n.normalize_set("quick red fox");
        assert_eq!(a.intersection_len(&b), 2);
        assert_eq!(a.union_len(&b), 4);
    }
}
