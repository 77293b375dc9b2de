// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::generation::GenerationError;
use crate::storage::StoreError;

/// Machine-readable error category reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    NoFileProvided,
    ConfigurationError,
    GenerationFailure,
    TransformFailure,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::NoFileProvided => "no_file_provided",
            ErrorCategory::ConfigurationError => "configuration_error",
            ErrorCategory::GenerationFailure => "generation_failure",
            ErrorCategory::TransformFailure => "transform_failure",
        }
    }
}

/// Anything that went wrong after validation
#[derive(Debug, Error)]
pub enum TransformFailure {
    #[error("{0}")]
    Generation(#[from] GenerationError),

    #[error("Failed to read normalized image {path}: {source}")]
    ReadNormalized {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to store generated image: {0}")]
    Storage(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No image file provided")]
    NoFileProvided,

    #[error("{0}")]
    Configuration(String),

    #[error("Failed to process image: {0}")]
    Transform(#[from] TransformFailure),
}

impl PipelineError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PipelineError::NoFileProvided => ErrorCategory::NoFileProvided,
            PipelineError::Configuration(_) => ErrorCategory::ConfigurationError,
            PipelineError::Transform(TransformFailure::Generation(e)) if e.is_unusable_output() => {
                ErrorCategory::GenerationFailure
            }
            PipelineError::Transform(_) => ErrorCategory::TransformFailure,
        }
    }

    /// Human-readable detail without the category prefix
    pub fn detail(&self) -> String {
        match self {
            PipelineError::Transform(inner) => inner.to_string(),
            other => other.to_string(),
        }
    }
}
