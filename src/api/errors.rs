// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::transform::{ErrorCategory, PipelineError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    /// Human-readable summary
    pub error: String,
    /// Machine-readable category
    pub error_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Clone)]
pub enum ApiError {
    NotFound(String),
    InvalidRequest(String),
    PayloadTooLarge { limit: usize },
    NoFileProvided,
    Configuration(String),
    GenerationFailure(String),
    TransformFailure(String),
    InternalError(String),
}

impl ApiError {
    pub fn to_response(&self) -> ErrorResponse {
        let (error, error_type, details) = match self {
            ApiError::NotFound(msg) => (msg.clone(), "not_found", None),
            ApiError::InvalidRequest(msg) => (msg.clone(), "invalid_request", None),
            ApiError::PayloadTooLarge { limit } => (
                "File too large".to_string(),
                "payload_too_large",
                Some(format!("maximum upload size is {} bytes", limit)),
            ),
            ApiError::NoFileProvided => (
                "No image file provided".to_string(),
                ErrorCategory::NoFileProvided.as_str(),
                None,
            ),
            ApiError::Configuration(msg) => {
                (msg.clone(), ErrorCategory::ConfigurationError.as_str(), None)
            }
            ApiError::GenerationFailure(detail) => (
                "Failed to process image".to_string(),
                ErrorCategory::GenerationFailure.as_str(),
                Some(detail.clone()),
            ),
            ApiError::TransformFailure(detail) => (
                "Failed to process image".to_string(),
                ErrorCategory::TransformFailure.as_str(),
                Some(detail.clone()),
            ),
            ApiError::InternalError(msg) => (msg.clone(), "internal_error", None),
        };

        ErrorResponse {
            error,
            error_type: error_type.to_string(),
            details,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::NotFound(_) => 404,
            ApiError::InvalidRequest(_) | ApiError::NoFileProvided => 400,
            ApiError::PayloadTooLarge { .. } => 413,
            ApiError::Configuration(_)
            | ApiError::GenerationFailure(_)
            | ApiError::TransformFailure(_)
            | ApiError::InternalError(_) => 500,
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err.category() {
            ErrorCategory::NoFileProvided => ApiError::NoFileProvided,
            ErrorCategory::ConfigurationError => ApiError::Configuration(err.detail()),
            ErrorCategory::GenerationFailure => ApiError::GenerationFailure(err.detail()),
            ErrorCategory::TransformFailure => ApiError::TransformFailure(err.detail()),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::PayloadTooLarge { limit } => {
                write!(f, "Payload too large (limit {} bytes)", limit)
            }
            ApiError::NoFileProvided => write!(f, "No image file provided"),
            ApiError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            ApiError::GenerationFailure(msg) => write!(f, "Generation failed: {}", msg),
            ApiError::TransformFailure(msg) => write!(f, "Transform failed: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_response())).into_response()
    }
}
