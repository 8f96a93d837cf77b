//! On-disk layout of pipeline artifacts.
//!
//! Every artifact for one posting lands in `<output>/<Company>/` and is named
//! `<Company>_<Title>_<suffix>`, where both parts are cleaned identifiers and
//! the title is cut to 15 characters. Names are a pure function of the job
//! details, so reruns for the same posting overwrite rather than pile up.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::text::clean_identifier;

const TITLE_PREFIX_LEN: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    JobDetails,
    Resume,
    CoverLetter,
}

impl ArtifactKind {
    fn suffix(&self) -> &'static str {
        match self {
            ArtifactKind::JobDetails => "JD.json",
            ArtifactKind::Resume => "resume.json",
            ArtifactKind::CoverLetter => "cv.txt",
        }
    }
}

fn identifier_field(job: &Value, key: &str, fallback: &str) -> String {
    let cleaned = job
        .get(key)
        .and_then(Value::as_str)
        .map(clean_identifier)
        .unwrap_or_default();
    if cleaned.is_empty() {
        fallback.to_string()
    } else {
        cleaned
    }
}

/// Path of the `kind` artifact for the posting described by `job`.
pub fn job_doc_name(job: &Value, output_dir: &Path, kind: ArtifactKind) -> PathBuf {
    let company = identifier_field(job, "company_name", "UnknownCompany");
    let title: String = identifier_field(job, "title", "UnknownRole")
        .chars()
        .take(TITLE_PREFIX_LEN)
        .collect();

    output_dir
        .join(&company)
        .join(format!("{company}_{title}_{}", kind.suffix()))
}

/// The PDF rendered next to a `.json` or `.txt` artifact.
pub fn pdf_sibling(path: &Path) -> PathBuf {
    path.with_extension("pdf")
}

pub async fn write_json(path: &Path, value: &Value) -> std::io::Result<()> {
    let body = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
    write_text(path, &body).await
}

pub async fn write_text(path: &Path, body: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, body).await
}
