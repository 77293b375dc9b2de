// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::errors::ApiError;
use super::http_server::AppState;
use crate::storage::StoreError;
use crate::vision::PNG_MIME;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// RFC 3339 time of the check
    pub timestamp: String,
    /// Style keys in catalog order
    pub styles: Vec<String>,
    pub api_key_configured: bool,
    pub version: String,
}

/// GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let pipeline = &state.pipeline;
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        styles: pipeline.styles().keys().to_vec(),
        api_key_configured: pipeline.readiness().credential_configured(),
        version: crate::version::VERSION_NUMBER.to_string(),
    })
}

/// GET /result/:id - raw PNG bytes of a stored result
pub async fn result_handler(
    State(state): State<AppState>,
    Path(image_id): Path<String>,
) -> Result<Response, ApiError> {
    match state.pipeline.results().retrieve(&image_id).await {
        Ok(bytes) => {
            debug!("Serving result {} ({} bytes)", image_id, bytes.len());
            Ok(([(header::CONTENT_TYPE, PNG_MIME)], bytes).into_response())
        }
        Err(StoreError::NotFound(_)) => Err(ApiError::NotFound("Image not found".to_string())),
        Err(e) => {
            error!("Failed to read result {}: {}", image_id, e);
            Err(ApiError::InternalError("Failed to read image".to_string()))
        }
    }
}
