use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extraction::ExtractionFailure;
use crate::llm_client::LlmError;
use crate::metrics::EmbeddingError;
use crate::pipeline::{PipelineFailure, StageError};

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Extraction(#[from] ExtractionFailure),

    #[error(transparent)]
    Pipeline(#[from] PipelineFailure),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StageError> for AppError {
    fn from(err: StageError) -> Self {
        match err {
            StageError::Extraction(e) => AppError::Extraction(e),
            StageError::Llm(e) => AppError::Llm(e),
            StageError::Embedding(EmbeddingError::Provider(e)) => AppError::Llm(e),
            StageError::Embedding(e) => AppError::Validation(e.to_string()),
            StageError::InvalidJson { .. } | StageError::Invalid(_) => {
                AppError::Validation(err.to_string())
            }
            StageError::Io(e) => AppError::Internal(e.into()),
            StageError::Serialize { .. } => AppError::Internal(err.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                json!({"code": "VALIDATION_ERROR", "message": msg}),
            ),
            AppError::Extraction(failure) => {
                tracing::warn!("{failure}");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    json!({
                        "code": "EXTRACTION_FAILED",
                        "message": failure.to_string(),
                        "attempts": failure.attempts,
                    }),
                )
            }
            AppError::Pipeline(failure) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "code": "PIPELINE_FAILED",
                    "message": failure.reason,
                    "stage": failure.stage,
                    "run_id": failure.run_id,
                }),
            ),
            AppError::Llm(e) => {
                tracing::error!("LLM error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    json!({"code": "LLM_ERROR", "message": "The language model request failed"}),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"code": "INTERNAL_ERROR", "message": "An internal server error occurred"}),
                )
            }
        };

        (status, Json(json!({ "error": error }))).into_response()
    }
}
