use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::extraction::{ContentExtractor, PdfTextExtractor};
use crate::llm_client::OpenAiClient;
use crate::metrics::SimilarityScorer;
use crate::pipeline::DocumentPipeline;
use crate::render::LatexRenderer;
use crate::text::{NormalizerConfig, TextNormalizer};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub content: Arc<ContentExtractor>,
    pub pdf: PdfTextExtractor,
    pub scorer: SimilarityScorer,
    pub pipeline: Arc<DocumentPipeline>,
}

impl AppState {
    /// Wires the extractors, scorer, model client and pipeline from `config`.
    pub fn from_config(config: Config) -> Result<Self> {
        let content = Arc::new(
            ContentExtractor::standard(&config.chrome_bin)
                .context("failed to build the URL content extractor")?,
        );
        let scorer = build_scorer(&config);
        let pipeline = Arc::new(build_pipeline(&config, Arc::clone(&content), scorer.clone())?);

        Ok(Self {
            config,
            content,
            pdf: PdfTextExtractor::default(),
            scorer,
            pipeline,
        })
    }
}

/// Scorer over a normalizer sized by `NORMALIZER_CACHE_CAPACITY`.
pub fn build_scorer(config: &Config) -> SimilarityScorer {
    let normalizer = TextNormalizer::new(
        NormalizerConfig::english().with_cache_capacity(config.normalizer_cache_capacity),
    );
    SimilarityScorer::new(Arc::new(normalizer))
}

/// The pipeline both binaries run: OpenAI for generation, LaTeX for PDFs and
/// embeddings when `ENABLE_EMBEDDING_METRIC` is set.
pub fn build_pipeline(
    config: &Config,
    content: Arc<ContentExtractor>,
    scorer: SimilarityScorer,
) -> Result<DocumentPipeline> {
    let client = Arc::new(
        OpenAiClient::new(config.openai_api_key.clone(), config.llm_model.clone())
            .context("failed to build the OpenAI client")?
            .with_base_url(&config.openai_base_url)
            .with_embedding_model(&config.embedding_model),
    );

    let mut pipeline = DocumentPipeline::new(client.clone(), content, scorer, &config.output_dir)
        .with_renderer(Arc::new(LatexRenderer::new(&config.pdflatex_bin)));
    if config.enable_embedding_metric {
        pipeline = pipeline.with_embeddings(client);
    }
    Ok(pipeline)
}
