// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Upload-to-result transform pipeline

pub mod asset;
pub mod error;
pub mod normalizer;
pub mod pipeline;

pub use asset::{
    ConversionStatus, FailedAttempt, NormalizationDegraded, NormalizedAsset, TransformRequest,
    UploadedAsset,
};
pub use error::{ErrorCategory, PipelineError, TransformFailure};
pub use normalizer::{NormalizeStrategy, Normalizer, CANONICAL_SIDE};
pub use pipeline::{Readiness, TransformOutcome, TransformPipeline};
