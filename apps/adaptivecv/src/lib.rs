//! Resume and cover-letter tailoring: content extraction, text
//! normalization, similarity scoring and the staged generation pipeline.

pub mod config;
pub mod errors;
pub mod extraction;
pub mod llm_client;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod render;
pub mod routes;
pub mod state;
pub mod text;
