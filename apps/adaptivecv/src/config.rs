use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::llm_client::{DEFAULT_BASE_URL, DEFAULT_EMBEDDING_MODEL, DEFAULT_MODEL};
use crate::text::normalizer::DEFAULT_CACHE_CAPACITY;

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or a number is malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub llm_model: String,
    pub embedding_model: String,
    pub openai_base_url: String,
    pub output_dir: PathBuf,
    pub port: u16,
    pub rust_log: String,
    pub normalizer_cache_capacity: usize,
    pub chrome_bin: String,
    pub pdflatex_bin: String,
    pub enable_embedding_metric: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Like `from_env`, but `api_key` (when given) replaces `OPENAI_API_KEY`.
    pub fn load(api_key: Option<String>) -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(api_key, |key| std::env::var(key).ok())
    }

    /// Builds the configuration from `lookup` instead of the process environment.
    pub fn from_lookup(
        api_key: Option<String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let vars = Vars(&lookup);
        let openai_api_key = match api_key {
            Some(key) => key,
            None => vars.require("OPENAI_API_KEY")?,
        };

        Ok(Config {
            openai_api_key,
            llm_model: vars.or("LLM_MODEL", DEFAULT_MODEL),
            embedding_model: vars.or("EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL),
            openai_base_url: vars.or("OPENAI_BASE_URL", DEFAULT_BASE_URL),
            output_dir: PathBuf::from(vars.or("OUTPUT_DIR", "output")),
            port: vars.parse("PORT", 8080)?,
            rust_log: vars.or("RUST_LOG", "info"),
            normalizer_cache_capacity: vars.parse(
                "NORMALIZER_CACHE_CAPACITY",
                DEFAULT_CACHE_CAPACITY,
            )?,
            chrome_bin: vars.or("CHROME_BIN", "chromium"),
            pdflatex_bin: vars.or("PDFLATEX_BIN", "pdflatex"),
            enable_embedding_metric: vars.parse("ENABLE_EMBEDDING_METRIC", false)?,
        })
    }
}

struct Vars<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Vars<'_> {
    fn require(&self, key: &str) -> Result<String> {
        (self.0)(key).with_context(|| format!("Required environment variable '{key}' is not set"))
    }

    fn or(&self, key: &str, default: &str) -> String {
        (self.0)(key).unwrap_or_else(|| default.to_string())
    }

    fn parse<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match (self.0)(key) {
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .with_context(|| format!("{key} has an invalid value '{raw}'")),
            None => Ok(default),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)], api_key: Option<&str>) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(api_key.map(str::to_string), |key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = config(&[("OPENAI_API_KEY", "sk-env")], None).unwrap();
        assert_eq!(config.openai_api_key, "sk-env");
        assert_eq!(config.port, 8080);
        assert_eq!(config.llm_model, DEFAULT_MODEL);
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert_eq!(config.normalizer_cache_capacity, DEFAULT_CACHE_CAPACITY);
        assert!(!config.enable_embedding_metric);
    }

    #[test]
    fn test_missing_api_key_is_an_error() {
        let err = config(&[], None).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_rejects_garbage_numbers() {
        let err = config(&[("ENABLE_EMBEDDING_METRIC", "maybe")], Some("sk-test")).unwrap_err();
        assert!(err.to_string().contains("ENABLE_EMBEDDING_METRIC"));
    }

    #[test]
    fn test_reads_trimmed_values() {
        let config = config(
            &[("NORMALIZER_CACHE_CAPACITY", " 64 "), ("PORT", "9000")],
            Some("sk-test"),
        )
        .unwrap();
        assert_eq!(config.normalizer_cache_capacity, 64);
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let config = config(&[("OPENAI_API_KEY", "sk-env")], Some("sk-test")).unwrap();
        assert_eq!(config.openai_api_key, "sk-test");
    }
}
