use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::errors::AppError;
use crate::metrics::{calculate_metrics, MetricsReport};
use crate::models::Document;
use crate::pipeline::{JobSource, PipelineInput, PipelineReport, UserDataSource};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ExtractUrlRequest {
    pub url: String,
}

#[derive(Deserialize)]
pub struct SimilarityRequest {
    pub document_a: String,
    pub document_b: String,
}

#[derive(Debug, Serialize)]
pub struct SimilarityResponse {
    pub jaccard_similarity: f64,
    pub overlap_coefficient: f64,
    pub cosine_similarity: f64,
}

#[derive(Deserialize)]
pub struct MetricsRequest {
    pub resume: Value,
    pub user_data: Value,
    pub job_details: Value,
}

#[derive(Deserialize)]
pub struct PipelineRequest {
    pub job_url: Option<String>,
    pub job_text: Option<String>,
    /// Resume PDF or profile JSON over http(s); the demo profile when omitted.
    /// Server-side paths are not accepted.
    pub user_data_url: Option<String>,
}

impl PipelineRequest {
    fn into_input(self) -> Result<PipelineInput, AppError> {
        let non_blank = |s: Option<String>| s.filter(|s| !s.trim().is_empty());
        let job = match (non_blank(self.job_url), non_blank(self.job_text)) {
            (Some(url), _) => JobSource::Url(url),
            (None, Some(text)) => JobSource::Text(text),
            (None, None) => {
                return Err(AppError::Validation(
                    "Either job_url or job_text must be provided".to_string(),
                ))
            }
        };
        let user_data = match UserDataSource::parse(self.user_data_url.as_deref()) {
            UserDataSource::File(_) => {
                return Err(AppError::Validation(
                    "user_data_url must be an http(s) URL".to_string(),
                ))
            }
            source => source,
        };
        Ok(PipelineInput { job, user_data })
    }
}

/// POST /api/v1/extract/url
pub async fn handle_extract_url(
    State(state): State<AppState>,
    Json(req): Json<ExtractUrlRequest>,
) -> Result<Json<Document>, AppError> {
    if req.url.trim().is_empty() {
        return Err(AppError::Validation("url is required".to_string()));
    }
    let document = state.content.extract_from_url(req.url.trim()).await?;
    Ok(Json(document))
}

/// POST /api/v1/extract/pdf
/// Expects a multipart body with the PDF in a `file` field.
pub async fn handle_extract_pdf(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Document>, AppError> {
    let mut upload: Option<Bytes> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
    {
        if field.name() == Some("file") {
            upload = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(e.to_string()))?,
            );
            break;
        }
    }

    let upload = upload
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| AppError::Validation("a non-empty 'file' field is required".to_string()))?;
    info!("Extracting text from an uploaded PDF ({} bytes)", upload.len());

    let document = state.pdf.extract_text_from_bytes(&upload).await?;
    Ok(Json(document))
}

/// POST /api/v1/similarity
pub async fn handle_similarity(
    State(state): State<AppState>,
    Json(req): Json<SimilarityRequest>,
) -> Json<SimilarityResponse> {
    let (a, b) = (req.document_a.as_str(), req.document_b.as_str());
    Json(SimilarityResponse {
        jaccard_similarity: state.scorer.jaccard(a, b),
        overlap_coefficient: state.scorer.overlap(a, b),
        cosine_similarity: state.scorer.cosine(a, b),
    })
}

/// POST /api/v1/metrics
pub async fn handle_metrics(
    State(state): State<AppState>,
    Json(req): Json<MetricsRequest>,
) -> Json<MetricsReport> {
    Json(calculate_metrics(
        &state.scorer,
        &req.resume,
        &req.user_data,
        &req.job_details,
    ))
}

/// POST /api/v1/pipeline
/// Runs every stage; a failed run is returned as 422 naming the stage.
pub async fn handle_pipeline(
    State(state): State<AppState>,
    Json(req): Json<PipelineRequest>,
) -> Result<Json<PipelineReport>, AppError> {
    let input = req.into_input()?;
    let report = state.pipeline.run(&input).await?;
    Ok(Json(report))
}
