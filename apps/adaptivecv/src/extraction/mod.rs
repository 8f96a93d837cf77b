//! Raw-text extraction from job-posting URLs and PDF files.
//!
//! Both extractors report failure as an `ExtractionFailure` value and never
//! panic past this module; callers decide whether an absent document is
//! fatal.

use serde::Serialize;
use thiserror::Error;

use crate::models::{Document, DocumentSource};

pub mod html;
pub mod pdf;
pub mod strategies;
pub mod web;

pub use pdf::PdfTextExtractor;
pub use web::ContentExtractor;

/// One strategy's try at producing a document.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionAttempt {
    pub strategy: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<Document>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ExtractionAttempt {
    pub fn succeeded(strategy: &str, document: &Document) -> Self {
        Self {
            strategy: strategy.to_string(),
            success: true,
            document: Some(document.clone()),
            reason: None,
        }
    }

    pub fn failed(strategy: &str, reason: impl Into<String>) -> Self {
        Self {
            strategy: strategy.to_string(),
            success: false,
            document: None,
            reason: Some(reason.into()),
        }
    }
}

#[derive(Debug, Clone, Error, Serialize)]
#[error("{kind} extraction failed for '{target}': {reason}")]
pub struct ExtractionFailure {
    pub kind: DocumentSource,
    /// The URL or file path that was being read.
    pub target: String,
    pub reason: String,
    pub attempts: Vec<ExtractionAttempt>,
}

impl ExtractionFailure {
    pub fn new(kind: DocumentSource, target: &str, reason: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.to_string(),
            reason: reason.into(),
            attempts: Vec::new(),
        }
    }

    pub fn with_attempts(mut self, attempts: Vec<ExtractionAttempt>) -> Self {
        self.attempts = attempts;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_message() {
        let failure = ExtractionFailure::new(DocumentSource::Pdf, "cv.pdf", "file not found");
        assert_eq!(
            failure.to_string(),
            "pdf extraction failed for 'cv.pdf': file not found"
        );
    }

    #[test]
    fn test_attempt_serialization_omits_empty_fields() {
        let attempt = ExtractionAttempt::failed("web_base", "HTTP status 500");
        let json = serde_json::to_value(&attempt).unwrap();
        assert!(json.get("document").is_none());
        assert_eq!(json["reason"], "HTTP status 500");
        assert_eq!(json["success"], false);
    }
}
