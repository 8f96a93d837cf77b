pub mod handlers;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Extraction
        .route("/api/v1/extract/url", post(handlers::handle_extract_url))
        .route("/api/v1/extract/pdf", post(handlers::handle_extract_pdf))
        // Scoring
        .route("/api/v1/similarity", post(handlers::handle_similarity))
        .route("/api/v1/metrics", post(handlers::handle_metrics))
        // Full run
        .route("/api/v1/pipeline", post(handlers::handle_pipeline))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::extraction::strategies::{ExtractionStrategy, StrategyError};
    use crate::extraction::{ContentExtractor, PdfTextExtractor};
    use crate::llm_client::{CompletionRequest, LanguageModel, LlmError};
    use crate::metrics::SimilarityScorer;
    use crate::pipeline::DocumentPipeline;

    struct SilentModel;

    #[async_trait]
    impl LanguageModel for SilentModel {
        async fn complete(&self, _request: CompletionRequest<'_>) -> Result<String, LlmError> {
            Err(LlmError::EmptyContent)
        }
    }

    struct Page(Result<&'static str, u16>);

    #[async_trait]
    impl ExtractionStrategy for Page {
        fn name(&self) -> &'static str {
            "page"
        }

        async fn try_extract(&self, _url: &str, _selectors: &[&str]) -> Result<String, StrategyError> {
            self.0.map(str::to_string).map_err(StrategyError::Status)
        }
    }

    fn test_state(page: Result<&'static str, u16>, output_dir: PathBuf) -> AppState {
        let config = Config {
            openai_api_key: "sk-test".to_string(),
            llm_model: "gpt-4o".to_string(),
            embedding_model: "text-embedding-ada-002".to_string(),
            openai_base_url: "http://127.0.0.1:9".to_string(),
            output_dir: output_dir.clone(),
            port: 0,
            rust_log: "info".to_string(),
            normalizer_cache_capacity: 16,
            chrome_bin: "chromium".to_string(),
            pdflatex_bin: "pdflatex".to_string(),
            enable_embedding_metric: false,
        };
        let content = Arc::new(ContentExtractor::with_strategies(
            vec![Box::new(Page(page))],
            Box::new(Page(Err(503))),
        ));
        let scorer = SimilarityScorer::default();
        let pipeline = DocumentPipeline::new(
            Arc::new(SilentModel),
            Arc::clone(&content),
            scorer.clone(),
            output_dir,
        );
        AppState {
            config,
            content,
            pdf: PdfTextExtractor::default(),
            scorer,
            pipeline: Arc::new(pipeline),
        }
    }

    /// The returned directory must outlive the router.
    fn router() -> (Router, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(
            Ok("Senior Rust Engineer\n\n  Remote  "),
            dir.path().to_path_buf(),
        ));
        (app, dir)
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(app, request).await
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _dir) = router();
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "adaptivecv");
    }

    #[tokio::test]
    async fn test_extract_url_returns_cleaned_text() {
        let (app, _dir) = router();
        let (status, body) = post_json(
            app,
            "/api/v1/extract/url",
            json!({"url": "https://jobs.example.com/1"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"text": "Senior Rust Engineer\nRemote", "source": "url"}));
    }

    #[tokio::test]
    async fn test_extract_url_requires_url() {
        let (app, _dir) = router();
        let (status, body) = post_json(app, "/api/v1/extract/url", json!({"url": " "})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_extract_url_failure_lists_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(Err(404), dir.path().to_path_buf()));
        let (status, body) = post_json(
            app,
            "/api/v1/extract/url",
            json!({"url": "https://jobs.example.com/gone"}),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "EXTRACTION_FAILED");
        assert_eq!(body["error"]["attempts"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_extract_pdf_requires_file_field() {
        let (app, _dir) = router();
        let body = "--XBOUNDARY\r\n\
            Content-Disposition: form-data; name=\"note\"\r\n\r\n\
            hello\r\n\
            --XBOUNDARY--\r\n";
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/extract/pdf")
            .header("content-type", "multipart/form-data; boundary=XBOUNDARY")
            .body(Body::from(body))
            .unwrap();
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("'file' field"));
    }

    #[tokio::test]
    async fn test_similarity_scores() {
        let (app, _dir) = router();
        let (status, body) = post_json(
            app,
            "/api/v1/similarity",
            json!({"document_a": "Rust engineer", "document_b": "Rust engineer"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        for key in ["jaccard_similarity", "overlap_coefficient", "cosine_similarity"] {
            assert!((body[key].as_f64().unwrap() - 1.0).abs() < 1e-9, "{key}");
        }
    }

    #[tokio::test]
    async fn test_metrics_report() {
        let (app, _dir) = router();
        let (status, body) = post_json(
            app,
            "/api/v1/metrics",
            json!({
                "resume": {"skills": ["Rust", "Tokio"]},
                "user_data": {"skills": ["Rust", "Go"]},
                "job_details": {"keywords": ["Rust"]}
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let keys: Vec<_> = body.as_object().unwrap().keys().cloned().collect();
        assert_eq!(
            keys,
            vec!["cosine_similarity", "jaccard_similarity", "overlap_coefficient"]
        );
        assert!(body["jaccard_similarity"]["job_match"].is_number());
    }

    #[tokio::test]
    async fn test_pipeline_requires_a_job() {
        let (app, _dir) = router();
        let (status, body) = post_json(app, "/api/v1/pipeline", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("job_url or job_text"));
    }

    #[tokio::test]
    async fn test_pipeline_failure_is_unprocessable() {
        let (app, _dir) = router();
        let (status, body) = post_json(
            app,
            "/api/v1/pipeline",
            json!({"job_text": "Backend Engineer at Acme"}),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "PIPELINE_FAILED");
        assert_eq!(body["error"]["stage"], "job_details_ready");
    }

    #[tokio::test]
    async fn test_pipeline_rejects_server_paths() {
        for path in ["../secret.json", "/etc/passwd", "resume.pdf"] {
            let (app, dir) = router();
            let (status, body) = post_json(
                app,
                "/api/v1/pipeline",
                json!({"job_text": "Backend Engineer at Acme", "user_data_url": path}),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
            assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
            assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0, "{path}");
        }
    }
}
