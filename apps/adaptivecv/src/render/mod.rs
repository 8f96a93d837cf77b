//! PDF rendering of pipeline artifacts through `pdflatex`.

use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

pub mod latex;

pub use latex::{latex_escape, letter_tex, resume_tex};

const LOG_TAIL_LINES: usize = 20;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("LaTeX compiler '{0}' is not installed")]
    ToolchainMissing(String),

    #[error("LaTeX compilation failed ({status}): {log_tail}")]
    Compile { status: String, log_tail: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render_resume(&self, resume: &Value, dest: &Path) -> Result<(), RenderError>;

    async fn render_letter(&self, letter: &str, dest: &Path) -> Result<(), RenderError>;
}

/// Compiles generated LaTeX in a scratch directory and copies the PDF (and
/// its `.tex` source) next to `dest`.
pub struct LatexRenderer {
    pdflatex_bin: String,
}

impl LatexRenderer {
    pub fn new(pdflatex_bin: impl Into<String>) -> Self {
        Self {
            pdflatex_bin: pdflatex_bin.into(),
        }
    }

    async fn compile(&self, tex: &str, dest: &Path) -> Result<(), RenderError> {
        let scratch = tempfile::tempdir()?;
        let tex_path = scratch.path().join("document.tex");
        tokio::fs::write(&tex_path, tex).await?;

        let output = Command::new(&self.pdflatex_bin)
            .args(["-interaction=nonstopmode", "-halt-on-error", "document.tex"])
            .current_dir(scratch.path())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    RenderError::ToolchainMissing(self.pdflatex_bin.clone())
                }
                _ => RenderError::Io(e),
            })?;

        if !output.status.success() {
            let log = String::from_utf8_lossy(&output.stdout);
            let lines: Vec<&str> = log.lines().collect();
            let tail = lines[lines.len().saturating_sub(LOG_TAIL_LINES)..].join("\n");
            return Err(RenderError::Compile {
                status: output.status.to_string(),
                log_tail: tail,
            });
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(scratch.path().join("document.pdf"), dest).await?;
        tokio::fs::copy(&tex_path, dest.with_extension("tex")).await?;
        debug!("Rendered {}", dest.display());
        Ok(())
    }
}

#[async_trait]
impl DocumentRenderer for LatexRenderer {
    async fn render_resume(&self, resume: &Value, dest: &Path) -> Result<(), RenderError> {
        self.compile(&resume_tex(resume), dest).await
    }

    async fn render_letter(&self, letter: &str, dest: &Path) -> Result<(), RenderError> {
        self.compile(&letter_tex(letter), dest).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_missing_toolchain_is_reported() {
        let renderer = LatexRenderer::new("/nonexistent/pdflatex");
        let dir = tempfile::tempdir().unwrap();
        let err = renderer
            .render_resume(&json!({"personal": {"full_name": "J"}}), &dir.path().join("r.pdf"))
            .await
            .unwrap_err();

        assert!(matches!(err, RenderError::ToolchainMissing(_)));
        assert!(!dir.path().join("r.pdf").exists());
    }
}
