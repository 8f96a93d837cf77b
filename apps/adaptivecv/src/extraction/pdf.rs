//! PDF → Document, page by page.
//!
//! Documents with more than `PARALLEL_PAGE_THRESHOLD` pages are split across
//! a bounded rayon pool. Each worker writes only its own slot of a
//! page-indexed result vector, so the output order never depends on which
//! page finishes first.

use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::models::{Document, DocumentSource};
use crate::text::clean_text_block;

use super::ExtractionFailure;

pub const PARALLEL_PAGE_THRESHOLD: usize = 10;
pub const MAX_PAGE_WORKERS: usize = 8;

#[derive(Debug, Error)]
pub enum PageError {
    #[error("failed to load PDF: {0}")]
    Load(String),

    #[error("failed to extract page {page}: {message}")]
    Page { page: usize, message: String },

    #[error("failed to start page workers: {0}")]
    Pool(String),
}

/// Read-only access to the pages of an opened PDF.
pub trait PageSource: Sync {
    fn page_count(&self) -> usize;

    /// Raw text of the page at zero-based `index`.
    fn page_text(&self, index: usize) -> Result<String, PageError>;
}

pub struct LopdfPageSource {
    document: lopdf::Document,
    page_numbers: Vec<u32>,
}

impl LopdfPageSource {
    pub fn open(path: &Path) -> Result<Self, PageError> {
        let document = lopdf::Document::load(path).map_err(|e| PageError::Load(e.to_string()))?;
        Ok(Self::from_document(document))
    }

    pub fn from_document(document: lopdf::Document) -> Self {
        let page_numbers = document.get_pages().keys().copied().collect();
        Self {
            document,
            page_numbers,
        }
    }
}

impl PageSource for LopdfPageSource {
    fn page_count(&self) -> usize {
        self.page_numbers.len()
    }

    fn page_text(&self, index: usize) -> Result<String, PageError> {
        let page_number = *self
            .page_numbers
            .get(index)
            .ok_or_else(|| PageError::Page {
                page: index,
                message: "page index out of range".to_string(),
            })?;
        self.document
            .extract_text(&[page_number])
            .map_err(|e| PageError::Page {
                page: index,
                message: e.to_string(),
            })
    }
}

fn extract_page(source: &dyn PageSource, index: usize) -> Result<String, PageError> {
    source.page_text(index).map(|raw| clean_text_block(&raw))
}

pub fn extract_sequential(source: &dyn PageSource) -> Result<Vec<String>, PageError> {
    (0..source.page_count())
        .map(|index| extract_page(source, index))
        .collect()
}

pub fn extract_parallel(source: &dyn PageSource, workers: usize) -> Result<Vec<String>, PageError> {
    let pool = ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
        .map_err(|e| PageError::Pool(e.to_string()))?;

    let mut pages = vec![String::new(); source.page_count()];
    pool.install(|| {
        pages
            .par_iter_mut()
            .enumerate()
            .try_for_each(|(index, slot)| -> Result<(), PageError> {
                *slot = extract_page(source, index)?;
                Ok(())
            })
    })?;
    Ok(pages)
}

#[derive(Debug, Clone)]
pub struct PdfTextExtractor {
    parallel_threshold: usize,
    max_workers: usize,
}

impl Default for PdfTextExtractor {
    fn default() -> Self {
        Self {
            parallel_threshold: PARALLEL_PAGE_THRESHOLD,
            max_workers: MAX_PAGE_WORKERS,
        }
    }
}

impl PdfTextExtractor {
    /// Cleaned text of every page, in page order.
    pub fn extract_pages(&self, source: &dyn PageSource) -> Result<Vec<String>, PageError> {
        let page_count = source.page_count();
        if page_count > self.parallel_threshold {
            let workers = page_count.min(self.max_workers);
            debug!("Extracting {page_count} pages with {workers} workers");
            extract_parallel(source, workers)
        } else {
            extract_sequential(source)
        }
    }

    /// Blocking extraction of the file at `path`.
    pub fn extract_file(&self, path: &Path) -> Result<Document, ExtractionFailure> {
        let target = path.display().to_string();
        let fail = |reason: String| {
            let failure = ExtractionFailure::new(DocumentSource::Pdf, &target, reason);
            error!("{failure}");
            failure
        };

        if target.trim().is_empty() {
            return Err(fail("No PDF path provided".to_string()));
        }
        if !path.is_file() {
            return Err(fail("file not found".to_string()));
        }

        let started = Instant::now();
        let source = LopdfPageSource::open(path).map_err(|e| fail(e.to_string()))?;
        let pages = self
            .extract_pages(&source)
            .map_err(|e| fail(e.to_string()))?;
        let mut text = pages.join("\n");

        if text.trim().is_empty() {
            debug!("No text from per-page extraction of {target}, retrying whole document");
            text = pdf_extract::extract_text(path)
                .map(|raw| clean_text_block(&raw))
                .unwrap_or_default();
        }
        if text.trim().is_empty() {
            return Err(fail("no extractable text".to_string()));
        }

        info!(
            "Extracted {} pages ({} chars) from {target} in {}ms",
            pages.len(),
            text.len(),
            started.elapsed().as_millis()
        );
        Ok(Document::new(text, DocumentSource::Pdf))
    }

    /// Runs `extract_file` on the blocking thread pool.
    pub async fn extract_text(&self, path: impl AsRef<Path>) -> Result<Document, ExtractionFailure> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let extractor = self.clone();
        let target = path.display().to_string();

        tokio::task::spawn_blocking(move || extractor.extract_file(&path))
            .await
            .unwrap_or_else(|e| {
                Err(ExtractionFailure::new(
                    DocumentSource::Pdf,
                    &target,
                    format!("extraction task failed: {e}"),
                ))
            })
    }

    /// Extracts an uploaded PDF by spilling it to a temporary file.
    pub async fn extract_text_from_bytes(&self, bytes: &[u8]) -> Result<Document, ExtractionFailure> {
        let spill = |e: std::io::Error| {
            ExtractionFailure::new(DocumentSource::Pdf, "<upload>", format!("temp file: {e}"))
        };

        let file = tempfile::Builder::new()
            .suffix(".pdf")
            .tempfile()
            .map_err(spill)?;
        tokio::fs::write(file.path(), bytes).await.map_err(spill)?;

        self.extract_text(file.path()).await
    }
}
