// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use super::handlers::{health_handler, result_handler};
use super::transform::transform_handler;
use crate::config::ServerConfig;
use crate::generation::{GenerationClient, ResponsesClient, ResponsesClientConfig};
use crate::storage::{ResultStore, TempStore};
use crate::transform::{Normalizer, TransformPipeline};

/// Headroom above the upload cap for multipart framing and the style field
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<TransformPipeline>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(pipeline: TransformPipeline, max_upload_bytes: usize) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            max_upload_bytes,
        }
    }
}

/// Build the shared state with the Responses API client
pub async fn build_state(config: &ServerConfig) -> anyhow::Result<AppState> {
    // Without a credential the pipeline refuses requests before generation
    let client_config = config
        .generation_config()
        .unwrap_or_else(|| ResponsesClientConfig::new(String::new()));
    let generator = Arc::new(ResponsesClient::new(client_config)?);
    build_state_with_generator(config, generator).await
}

/// Build the shared state around any generation client
pub async fn build_state_with_generator(
    config: &ServerConfig,
    generator: Arc<dyn GenerationClient>,
) -> anyhow::Result<AppState> {
    let temp_store = TempStore::new(&config.uploads_dir);
    temp_store.ensure_dir().await?;
    let results = ResultStore::new(&config.results_dir);
    results.ensure_dir().await?;

    let styles = config.load_styles()?;
    info!(
        "✅ Styles loaded: {} (default {})",
        styles.keys().join(", "),
        styles.default_key()
    );

    let pipeline = TransformPipeline::new(
        config.readiness(),
        temp_store,
        Normalizer::new(config.canonical_size),
        Arc::new(styles),
        generator,
        results,
    );

    Ok(AppState::new(pipeline, config.max_upload_bytes))
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes.saturating_add(FORM_OVERHEAD_BYTES);

    Router::new()
        .route("/transform", post(transform_handler))
        .route("/result/:image_id", get(result_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(config: &ServerConfig, state: AppState) -> std::io::Result<()> {
    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("API server listening on {}", addr);

    axum::serve(listener, build_router(state)).await
}
