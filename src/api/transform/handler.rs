// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Transform endpoint handler

use axum::{extract::State, Json};
use axum_extra::extract::Multipart;
use tracing::{error, info};

use super::request::TransformForm;
use super::response::TransformResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::transform::UploadedAsset;

/// POST /transform - Restyle an uploaded photo
///
/// Pipeline:
/// 1. Read the multipart form (image part must be `image/*`, size capped)
/// 2. Write the image part to the temporary store
/// 3. Hand the upload to the transform pipeline, which owns it from then on
/// 4. Return the stored result id
pub async fn transform_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<TransformResponse>, ApiError> {
    info!("🎨 Transform request received");

    let form = TransformForm::read(multipart, state.max_upload_bytes).await?;
    let pipeline = &state.pipeline;
    let style = form.style_key(pipeline.styles().default_key()).to_string();

    let upload = match form.image {
        Some(file) => {
            let path = pipeline
                .temp_store()
                .write_upload(&file.bytes, file.file_name.as_deref(), &file.content_type)
                .await
                .map_err(|e| {
                    error!("Failed to store upload: {}", e);
                    ApiError::InternalError("Failed to store upload".to_string())
                })?;
            Some(UploadedAsset::new(
                path,
                file.content_type,
                file.bytes.len() as u64,
            ))
        }
        None => None,
    };

    let outcome = pipeline.run_transform(upload, &style).await?;
    Ok(Json(TransformResponse::from(&outcome)))
}
