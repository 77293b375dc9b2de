// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Multipart intake for the transform endpoint

use axum::http::StatusCode;
use axum_extra::extract::multipart::{Field, MultipartError};
use axum_extra::extract::Multipart;
use tracing::debug;

use crate::api::errors::ApiError;
use crate::vision::mime_essence;

/// Form field carrying the photo
pub const IMAGE_FIELD: &str = "image";
/// Form field carrying the style key
pub const STYLE_FIELD: &str = "style";

/// Image part of the form, fully buffered
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Parsed `POST /transform` form
#[derive(Debug, Clone, Default)]
pub struct TransformForm {
    pub image: Option<UploadedFile>,
    pub style: Option<String>,
}

impl TransformForm {
    /// Read the form, enforcing the upload cap and the `image/*` filter.
    ///
    /// Unknown fields are skipped. A form without an image part is not an
    /// error here; the pipeline reports it.
    pub async fn read(mut multipart: Multipart, max_upload_bytes: usize) -> Result<Self, ApiError> {
        let mut form = TransformForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(e, max_upload_bytes))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                IMAGE_FIELD => {
                    form.image = Some(read_image(field, max_upload_bytes).await?);
                }
                STYLE_FIELD => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| multipart_error(e, max_upload_bytes))?;
                    let value = value.trim();
                    if !value.is_empty() {
                        form.style = Some(value.to_string());
                    }
                }
                other => debug!("Ignoring form field '{}'", other),
            }
        }

        Ok(form)
    }

    /// Requested style key, or `default` when the form has none
    pub fn style_key<'a>(&'a self, default: &'a str) -> &'a str {
        self.style.as_deref().unwrap_or(default)
    }
}

async fn read_image(mut field: Field, limit: usize) -> Result<UploadedFile, ApiError> {
    let content_type = mime_essence(field.content_type().unwrap_or_default());
    if !content_type.starts_with("image/") {
        return Err(ApiError::InvalidRequest(
            "Only image files are allowed".to_string(),
        ));
    }
    let file_name = field.file_name().map(str::to_string);

    let mut bytes = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if bytes.len() + chunk.len() > limit {
            return Err(ApiError::PayloadTooLarge { limit });
        }
        bytes.extend_from_slice(&chunk);
    }

    debug!(
        "Received image field: name={:?}, type={}, {} bytes",
        file_name,
        content_type,
        bytes.len()
    );

    Ok(UploadedFile {
        file_name,
        content_type,
        bytes,
    })
}

fn multipart_error(err: MultipartError, limit: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge { limit }
    } else {
        ApiError::InvalidRequest(err.body_text())
    }
}
