use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a piece of extracted text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSource {
    Url,
    Pdf,
    Raw,
}

impl DocumentSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentSource::Url => "url",
            DocumentSource::Pdf => "pdf",
            DocumentSource::Raw => "raw",
        }
    }
}

impl fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extracted text plus its provenance.
///
/// Immutable once built: transformations return a new `Document`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    text: String,
    source: DocumentSource,
}

impl Document {
    pub fn new(text: impl Into<String>, source: DocumentSource) -> Self {
        Self {
            text: text.into(),
            source,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source(&self) -> DocumentSource {
        self.source
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn into_text(self) -> String {
        self.text
    }

    /// Returns a new document with `f` applied to the text, keeping the source.
    pub fn map_text(&self, f: impl FnOnce(&str) -> String) -> Document {
        Document::new(f(&self.text), self.source)
    }
}
