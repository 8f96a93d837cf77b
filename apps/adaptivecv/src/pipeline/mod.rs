//! DocumentPipeline: the end-to-end resume and cover-letter run.
//!
//! A run moves through a fixed sequence of stages:
//!
//! ```text
//! start → user_data_ready → job_details_ready → resume_ready
//!       → cover_letter_ready → metrics_ready → done
//! ```
//!
//! Each stage consumes the previous stage's output. The first stage that
//! fails puts the run into a terminal failed state carrying that stage and
//! the reason; nothing is retried. Every stage is also callable on its own.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use url::Url;
use uuid::Uuid;

use crate::extraction::{ContentExtractor, ExtractionFailure, PdfTextExtractor};
use crate::llm_client::prompts::format_instructions;
use crate::llm_client::{CompletionRequest, EmbeddingProvider, LanguageModel, LlmError};
use crate::metrics::{
    calculate_embedding_metric, calculate_metrics, EmbeddingError, MetricsReport,
    SimilarityMetric, SimilarityScorer,
};
use crate::render::DocumentRenderer;
use crate::text::clean_generated_text;

pub mod output;
pub mod prompts;
pub mod resume;

use output::{job_doc_name, pdf_sibling, write_json, write_text, ArtifactKind};

/// Candidate profile used when no user data is supplied.
pub const DEMO_PROFILE: &str = include_str!("../../demo/user_profile.json");

// ── State machine ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Start,
    UserDataReady,
    JobDetailsReady,
    ResumeReady,
    CoverLetterReady,
    MetricsReady,
    Done,
}

impl PipelineStage {
    pub fn next(self) -> Option<PipelineStage> {
        use PipelineStage::*;
        match self {
            Start => Some(UserDataReady),
            UserDataReady => Some(JobDetailsReady),
            JobDetailsReady => Some(ResumeReady),
            ResumeReady => Some(CoverLetterReady),
            CoverLetterReady => Some(MetricsReady),
            MetricsReady => Some(Done),
            Done => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        use PipelineStage::*;
        match self {
            Start => "start",
            UserDataReady => "user_data_ready",
            JobDetailsReady => "job_details_ready",
            ResumeReady => "resume_ready",
            CoverLetterReady => "cover_letter_ready",
            MetricsReady => "metrics_ready",
            Done => "done",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why one stage could not produce its output.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Extraction(#[from] ExtractionFailure),

    #[error("language model: {0}")]
    Llm(#[from] LlmError),

    #[error("embedding metric: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON in {path}: {source}")]
    InvalidJson {
        path: String,
        source: serde_json::Error,
    },

    #[error("could not serialize {what}: {source}")]
    Serialize {
        what: &'static str,
        source: serde_json::Error,
    },

    #[error("{0}")]
    Invalid(String),
}

/// Pretty JSON for embedding `value` in a prompt.
pub(crate) fn prompt_json(value: &Value, what: &'static str) -> Result<String, StageError> {
    serde_json::to_string_pretty(value).map_err(|source| StageError::Serialize { what, source })
}

/// Terminal failure of a run. `stage` is the stage that could not be reached.
#[derive(Debug, Clone, Error, Serialize)]
#[error("pipeline failed before {stage}: {reason}")]
pub struct PipelineFailure {
    pub run_id: Uuid,
    pub stage: PipelineStage,
    pub reason: String,
    pub visited: Vec<PipelineStage>,
}

/// Tracks where a run is. Transitions only move one step forward, and a
/// failed run accepts no further transitions.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    id: Uuid,
    stage: PipelineStage,
    visited: Vec<PipelineStage>,
    failure: Option<PipelineFailure>,
}

impl Default for PipelineRun {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineRun {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            stage: PipelineStage::Start,
            visited: vec![PipelineStage::Start],
            failure: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    pub fn visited(&self) -> &[PipelineStage] {
        &self.visited
    }

    pub fn failure(&self) -> Option<&PipelineFailure> {
        self.failure.as_ref()
    }

    /// Moves to `to`, which must be the stage right after the current one.
    pub fn advance(&mut self, to: PipelineStage) -> Result<(), PipelineFailure> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        if self.stage.next() != Some(to) {
            return Err(self.fail(to, format!("illegal transition {} -> {to}", self.stage)));
        }
        self.stage = to;
        self.visited.push(to);
        Ok(())
    }

    /// Enters the terminal failed state while trying to reach `stage`.
    pub fn fail(&mut self, stage: PipelineStage, reason: impl Into<String>) -> PipelineFailure {
        if let Some(failure) = &self.failure {
            return failure.clone();
        }
        let failure = PipelineFailure {
            run_id: self.id,
            stage,
            reason: reason.into(),
            visited: self.visited.clone(),
        };
        self.failure = Some(failure.clone());
        failure
    }
}

// ── Inputs and outputs ──────────────────────────────────────────────────────

/// Where the candidate's data comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserDataSource {
    Demo,
    Url(String),
    File(PathBuf),
}

impl UserDataSource {
    /// `None`/blank → demo profile, an http(s) URL → URL, anything else → file path.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None => UserDataSource::Demo,
            Some(raw) => match Url::parse(raw) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => {
                    UserDataSource::Url(raw.to_string())
                }
                _ => UserDataSource::File(PathBuf::from(raw)),
            },
        }
    }
}

/// Where the job posting comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobSource {
    Url(String),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct PipelineInput {
    pub job: JobSource,
    pub user_data: UserDataSource,
}

#[derive(Debug, Clone)]
pub struct JobDetails {
    /// Parsed job details, without the source URL.
    pub details: Value,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ResumeArtifact {
    pub resume: Value,
    pub json_path: PathBuf,
    pub pdf_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct CoverLetterArtifact {
    pub text: String,
    pub text_path: PathBuf,
    pub pdf_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OutputFiles {
    pub job_details: Option<PathBuf>,
    pub resume_json: Option<PathBuf>,
    pub resume_pdf: Option<PathBuf>,
    pub cover_letter_text: Option<PathBuf>,
    pub cover_letter_pdf: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stages: Vec<PipelineStage>,
    pub files: OutputFiles,
    pub metrics: MetricsReport,
}

// ── Pipeline ────────────────────────────────────────────────────────────────

pub struct DocumentPipeline {
    llm: Arc<dyn LanguageModel>,
    content: Arc<ContentExtractor>,
    pdf: PdfTextExtractor,
    scorer: SimilarityScorer,
    embeddings: Option<Arc<dyn EmbeddingProvider>>,
    renderer: Option<Arc<dyn DocumentRenderer>>,
    output_dir: PathBuf,
}

impl DocumentPipeline {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        content: Arc<ContentExtractor>,
        scorer: SimilarityScorer,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            llm,
            content,
            pdf: PdfTextExtractor::default(),
            scorer,
            embeddings: None,
            renderer: None,
            output_dir: output_dir.into(),
        }
    }

    /// Also compute the embedding metric with `provider`.
    pub fn with_embeddings(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embeddings = Some(provider);
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn DocumentRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Runs every stage in order and reports the produced files and metrics.
    pub async fn run(&self, input: &PipelineInput) -> Result<PipelineReport, PipelineFailure> {
        let started_at = Utc::now();
        let mut run = PipelineRun::new();
        let mut files = OutputFiles::default();
        info!("Starting pipeline run {}", run.id());

        let user = stage(&mut run, PipelineStage::UserDataReady, self.load_user_data(&input.user_data))
            .await?;

        let job = stage(&mut run, PipelineStage::JobDetailsReady, self.extract_job_details(&input.job))
            .await?;
        files.job_details = Some(job.path.clone());

        let resume = stage(&mut run, PipelineStage::ResumeReady, self.build_resume(&job.details, &user))
            .await?;
        files.resume_json = Some(resume.json_path.clone());
        files.resume_pdf = resume.pdf_path.clone();

        let letter = stage(
            &mut run,
            PipelineStage::CoverLetterReady,
            self.write_cover_letter(&job.details, &user),
        )
        .await?;
        files.cover_letter_text = Some(letter.text_path.clone());
        files.cover_letter_pdf = letter.pdf_path.clone();

        let metrics = stage(
            &mut run,
            PipelineStage::MetricsReady,
            self.score(&resume.resume, &user, &job.details),
        )
        .await?;

        run.advance(PipelineStage::Done)?;
        info!("Pipeline run {} completed", run.id());

        Ok(PipelineReport {
            run_id: run.id(),
            started_at,
            finished_at: Utc::now(),
            stages: run.visited().to_vec(),
            files,
            metrics,
        })
    }

    // ── Stage: user data ────────────────────────────────────────────────────

    /// Candidate data as JSON: the demo profile, a JSON file as-is, or a
    /// PDF/URL resume parsed by the model.
    pub async fn load_user_data(&self, source: &UserDataSource) -> Result<Value, StageError> {
        match source {
            UserDataSource::Demo => {
                info!("No user data provided, using the demo profile");
                serde_json::from_str(DEMO_PROFILE).map_err(|source| StageError::InvalidJson {
                    path: "demo profile".to_string(),
                    source,
                })
            }
            UserDataSource::Url(url) => {
                let document = self.content.extract_from_url(url).await?;
                self.parse_resume_text(document.text()).await
            }
            UserDataSource::File(path) => {
                if !path.is_file() {
                    return Err(StageError::Invalid(format!(
                        "User data file not found: {}",
                        path.display()
                    )));
                }
                let extension = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(str::to_ascii_lowercase)
                    .unwrap_or_default();
                match extension.as_str() {
                    "pdf" => {
                        let document = self.pdf.extract_text(path).await?;
                        self.parse_resume_text(document.text()).await
                    }
                    "json" => {
                        let raw = tokio::fs::read_to_string(path).await?;
                        serde_json::from_str(&raw).map_err(|source| StageError::InvalidJson {
                            path: path.display().to_string(),
                            source,
                        })
                    }
                    other => Err(StageError::Invalid(format!(
                        "Unsupported file format '.{other}': provide a PDF, a JSON file or a URL"
                    ))),
                }
            }
        }
    }

    async fn parse_resume_text(&self, resume_text: &str) -> Result<Value, StageError> {
        let prompt = prompts::render(
            prompts::RESUME_DETAILS_EXTRACTOR,
            &[
                ("resume_text", resume_text),
                ("format_instructions", &format_instructions(prompts::RESUME_SCHEMA)),
            ],
        );
        let resume = self.llm.complete_json(&prompt).await?;
        info!("Resume parsed to JSON");
        Ok(resume)
    }

    // ── Stage: job details ──────────────────────────────────────────────────

    /// Parses the posting into job JSON and saves it (with the source URL).
    pub async fn extract_job_details(&self, job: &JobSource) -> Result<JobDetails, StageError> {
        let (content, url) = match job {
            JobSource::Url(url) => {
                let document = self.content.extract_from_url(url).await?;
                (document.into_text(), Some(url.as_str()))
            }
            JobSource::Text(text) if !text.trim().is_empty() => (text.clone(), None),
            JobSource::Text(_) => {
                return Err(StageError::Invalid(
                    "Either a job URL or job description content must be provided".to_string(),
                ))
            }
        };

        let prompt = prompts::render(
            prompts::JOB_DETAILS_EXTRACTOR,
            &[
                ("job_description", &content),
                ("format_instructions", &format_instructions(prompts::JOB_DETAILS_SCHEMA)),
            ],
        );
        let details = self.llm.complete_json(&prompt).await?;
        if !details.is_object() {
            return Err(StageError::Invalid(
                "job details reply is not a JSON object".to_string(),
            ));
        }

        let path = job_doc_name(&details, &self.output_dir, ArtifactKind::JobDetails);
        let mut saved = details.clone();
        if let (Some(url), Some(map)) = (url, saved.as_object_mut()) {
            map.insert("url".to_string(), Value::String(url.to_string()));
        }
        write_json(&path, &saved).await?;
        info!("Job details saved to {}", path.display());

        Ok(JobDetails { details, path })
    }

    // ── Stage: resume ───────────────────────────────────────────────────────

    /// Builds the tailored resume section by section, saves it and renders it.
    pub async fn build_resume(&self, job: &Value, user: &Value) -> Result<ResumeArtifact, StageError> {
        let job_description = prompt_json(job, "job details")?;
        let mut resume = Map::new();
        resume.insert("personal".to_string(), resume::personal_section(user));
        let mut kept = 0;

        for section in resume::SECTIONS {
            let started = Instant::now();
            let prompt = section.prompt(user, &job_description)?;
            let reply = match self.llm.complete_json(&prompt).await {
                Ok(reply) => reply,
                Err(LlmError::EmptyContent) => {
                    warn!("Empty reply for the {} section, skipping", section.key);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            debug!(
                "{} section generated in {}ms",
                section.key,
                started.elapsed().as_millis()
            );

            match section.accept(&reply) {
                Some(value) => {
                    resume.insert(section.key.to_string(), value);
                    kept += 1;
                }
                None => warn!("Reply for the {} section had no usable content", section.key),
            }
        }

        if kept == 0 {
            return Err(StageError::Invalid(
                "no resume section could be generated".to_string(),
            ));
        }

        resume.insert(
            "keywords".to_string(),
            Value::String(resume::keywords_line(job)),
        );
        let resume = Value::Object(resume);

        let json_path = job_doc_name(job, &self.output_dir, ArtifactKind::Resume);
        write_json(&json_path, &resume).await?;
        info!("Resume JSON saved to {}", json_path.display());

        let pdf_path = match &self.renderer {
            Some(renderer) => {
                let pdf_path = pdf_sibling(&json_path);
                match renderer.render_resume(&resume, &pdf_path).await {
                    Ok(()) => Some(pdf_path),
                    Err(e) => {
                        warn!("Resume PDF not rendered: {e}");
                        None
                    }
                }
            }
            None => None,
        };

        Ok(ResumeArtifact {
            resume,
            json_path,
            pdf_path,
        })
    }

    // ── Stage: cover letter ─────────────────────────────────────────────────

    pub async fn write_cover_letter(
        &self,
        job: &Value,
        user: &Value,
    ) -> Result<CoverLetterArtifact, StageError> {
        let job_description = prompt_json(job, "job details")?;
        let background = prompt_json(user, "user data")?;
        let prompt = prompts::render(
            prompts::COVER_LETTER_GENERATOR,
            &[
                ("job_description", &job_description),
                ("my_work_information", &background),
            ],
        );

        let text = match self.llm.complete(CompletionRequest::text(&prompt).longer()).await {
            Ok(raw) => clean_generated_text(&raw),
            Err(LlmError::EmptyContent) => String::new(),
            Err(e) => return Err(e.into()),
        };
        if text.is_empty() {
            return Err(StageError::Invalid(
                "the model returned an empty cover letter".to_string(),
            ));
        }

        let text_path = job_doc_name(job, &self.output_dir, ArtifactKind::CoverLetter);
        write_text(&text_path, &text).await?;
        info!("Cover letter saved to {}", text_path.display());

        let pdf_path = match &self.renderer {
            Some(renderer) => {
                let pdf_path = pdf_sibling(&text_path);
                match renderer.render_letter(&text, &pdf_path).await {
                    Ok(()) => Some(pdf_path),
                    Err(e) => {
                        warn!("Cover letter PDF not rendered: {e}");
                        None
                    }
                }
            }
            None => None,
        };

        Ok(CoverLetterArtifact {
            text,
            text_path,
            pdf_path,
        })
    }

    // ── Stage: metrics ──────────────────────────────────────────────────────

    pub async fn score(
        &self,
        resume: &Value,
        user: &Value,
        job: &Value,
    ) -> Result<MetricsReport, StageError> {
        let mut report = calculate_metrics(&self.scorer, resume, user, job);
        if let Some(provider) = &self.embeddings {
            let score = calculate_embedding_metric(provider.as_ref(), resume, user, job).await?;
            report.insert(SimilarityMetric::Embedding, score);
        }

        for metric in [
            SimilarityMetric::Jaccard,
            SimilarityMetric::Overlap,
            SimilarityMetric::Cosine,
            SimilarityMetric::Embedding,
        ] {
            if let Some(score) = report.get(metric) {
                info!(
                    "{} - User Personalization: {:.4}, Job Alignment: {:.4}, Job Match: {:.4}",
                    metric.report_key(),
                    score.user_personalization,
                    score.job_alignment,
                    score.job_match
                );
            }
        }
        Ok(report)
    }
}

/// Awaits one stage and moves `run` forward, or fails it for good.
async fn stage<T, F>(run: &mut PipelineRun, to: PipelineStage, work: F) -> Result<T, PipelineFailure>
where
    F: std::future::Future<Output = Result<T, StageError>>,
{
    let started = Instant::now();
    match work.await {
        Ok(value) => {
            debug!("{to} reached in {}ms", started.elapsed().as_millis());
            run.advance(to)?;
            Ok(value)
        }
        Err(e) => {
            let failure = run.fail(to, e.to_string());
            error!("{failure}");
            Err(failure)
        }
    }
}
