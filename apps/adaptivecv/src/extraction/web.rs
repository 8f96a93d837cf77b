//! URL → Document through an ordered chain of page-loading strategies.
//!
//! Each primary strategy is tried in turn; the first whose cleaned output is
//! non-empty wins. When every primary strategy fails, a raw HTML fetch is the
//! last resort. Nothing here panics or raises past `extract_from_url`: every
//! failure becomes an `ExtractionFailure` carrying the full attempt trace.

use std::time::Instant;

use tracing::{debug, error, info, warn};
use url::Url;

use crate::models::{Document, DocumentSource};
use crate::text::clean_text_block;

use super::strategies::{
    ExtractionStrategy, RawHtmlFallback, RenderedPageLoader, StrategyError, UnstructuredLoader,
    WebBaseLoader,
};
use super::{ExtractionAttempt, ExtractionFailure};

pub const BASIC_SELECTORS: &[&str] = &[
    "header",
    "footer",
    "nav",
    ".ad",
    ".advertisement",
    ".cookie-notice",
];

pub const LINKEDIN_SELECTORS: &[&str] = &[
    "#main-content > section.right-rail",
    ".job-alert-redirect-section",
    ".similar-jobs",
    ".share-box",
];

pub const INDEED_SELECTORS: &[&str] = &[
    "#mosaic-modalLightbox",
    "#jobsearch-ViewjobPaneWrapper",
    "#jobsearch-ViewJobButtons",
];

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{domain}"))
}

/// Boilerplate selectors to strip for `url`: the basic set, plus the
/// LinkedIn or Indeed set when the host belongs to those sites.
pub fn selectors_for_url(url: &str) -> Vec<&'static str> {
    let mut selectors = BASIC_SELECTORS.to_vec();
    let host = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase));

    if let Some(host) = host {
        if host_matches(&host, "linkedin.com") {
            selectors.extend_from_slice(LINKEDIN_SELECTORS);
        } else if host_matches(&host, "indeed.com") {
            selectors.extend_from_slice(INDEED_SELECTORS);
        }
    }
    selectors
}

pub struct ContentExtractor {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    fallback: Box<dyn ExtractionStrategy>,
}

impl ContentExtractor {
    /// The production chain: rendered page, unstructured, web base, then the
    /// raw HTML fallback.
    pub fn standard(browser_bin: &str) -> Result<Self, StrategyError> {
        Ok(Self::with_strategies(
            vec![
                Box::new(RenderedPageLoader::new(browser_bin)),
                Box::new(UnstructuredLoader::new()?),
                Box::new(WebBaseLoader::new()?),
            ],
            Box::new(RawHtmlFallback::new()?),
        ))
    }

    pub fn with_strategies(
        strategies: Vec<Box<dyn ExtractionStrategy>>,
        fallback: Box<dyn ExtractionStrategy>,
    ) -> Self {
        Self {
            strategies,
            fallback,
        }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies
            .iter()
            .map(|s| s.name())
            .chain(std::iter::once(self.fallback.name()))
            .collect()
    }

    /// Runs the chain and returns the winning document (if any) along with
    /// every attempt made, in order.
    pub async fn attempt_chain(&self, url: &str) -> (Option<Document>, Vec<ExtractionAttempt>) {
        let selectors = selectors_for_url(url);
        let mut attempts = Vec::with_capacity(self.strategies.len() + 1);

        for strategy in &self.strategies {
            let started = Instant::now();
            let outcome = strategy.try_extract(url, &selectors).await;
            debug!(
                "strategy {} finished in {}ms",
                strategy.name(),
                started.elapsed().as_millis()
            );

            match outcome {
                Ok(raw) => {
                    let cleaned = clean_text_block(&raw);
                    if cleaned.is_empty() {
                        attempts.push(ExtractionAttempt::failed(strategy.name(), "empty content"));
                        continue;
                    }
                    let document = Document::new(cleaned, DocumentSource::Url);
                    attempts.push(ExtractionAttempt::succeeded(strategy.name(), &document));
                    return (Some(document), attempts);
                }
                Err(e) => {
                    warn!("Error with {}: {e}", strategy.name());
                    attempts.push(ExtractionAttempt::failed(strategy.name(), e.to_string()));
                }
            }
        }

        info!("All loaders failed for {url}, trying raw HTML fallback");
        match self.fallback.try_extract(url, &selectors).await {
            Ok(text) if !text.trim().is_empty() => {
                let document = Document::new(text, DocumentSource::Url);
                attempts.push(ExtractionAttempt::succeeded(self.fallback.name(), &document));
                (Some(document), attempts)
            }
            Ok(_) => {
                attempts.push(ExtractionAttempt::failed(self.fallback.name(), "empty content"));
                (None, attempts)
            }
            Err(e) => {
                warn!("Raw HTML fallback failed for {url}: {e}");
                attempts.push(ExtractionAttempt::failed(self.fallback.name(), e.to_string()));
                (None, attempts)
            }
        }
    }

    pub async fn extract_from_url(&self, url: &str) -> Result<Document, ExtractionFailure> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ExtractionFailure::new(
                DocumentSource::Url,
                url,
                "No URL provided",
            ));
        }

        match self.attempt_chain(url).await {
            (Some(document), _) => {
                info!(
                    "Extracted {} chars of page content from {url}",
                    document.text().len()
                );
                Ok(document)
            }
            (None, attempts) => {
                let failure = ExtractionFailure::new(
                    DocumentSource::Url,
                    url,
                    "every extraction strategy failed",
                )
                .with_attempts(attempts);
                error!("{failure}");
                Err(failure)
            }
        }
    }
}
