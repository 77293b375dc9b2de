// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Transform pipeline orchestrator
//!
//! Pipeline:
//! 1. Validate (upload present, credential configured)
//! 2. Normalize the upload (never fails; may pass the original through)
//! 3. Resolve the style instruction (unknown keys use the default style)
//! 4. Encode the normalized image for transport and pick its MIME type
//! 5. Generate via the external service
//! 6. Persist the result and return its identifier
//! 7. Remove the upload and the normalized intermediate, on every exit path

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::asset::{ConversionStatus, TransformRequest, UploadedAsset};
use super::error::{PipelineError, TransformFailure};
use super::normalizer::Normalizer;
use crate::generation::{GenerationClient, InlineImage};
use crate::storage::{ResultStore, ScratchFile, StoredImage, TempStore};
use crate::styles::StyleCatalog;

/// Whether the pipeline can reach the generation service at all.
///
/// Resolved once from configuration at startup and handed to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Readiness {
    credential_configured: bool,
}

impl Readiness {
    pub fn new(credential_configured: bool) -> Self {
        Self {
            credential_configured,
        }
    }

    pub fn from_credential(credential: Option<&str>) -> Self {
        Self::new(credential.map(|c| !c.trim().is_empty()).unwrap_or(false))
    }

    pub fn credential_configured(&self) -> bool {
        self.credential_configured
    }
}

/// Successful run of the pipeline
#[derive(Debug, Clone)]
pub struct TransformOutcome {
    pub image: StoredImage,
    /// Style key as requested
    pub style: String,
    /// Style whose instruction was used
    pub resolved_style: String,
    pub converted: bool,
}

/// Temporary files owned by one request.
///
/// `cleanup` runs at most once; dropping the guard runs it too, which covers
/// early returns and a cancelled request future. While normalization is in
/// flight its output guard lives in the blocking task instead.
struct TempArtifacts {
    upload: Option<ScratchFile>,
    normalized: Option<ScratchFile>,
}

impl TempArtifacts {
    fn new(upload: PathBuf) -> Self {
        Self {
            upload: Some(ScratchFile::new(upload)),
            normalized: None,
        }
    }

    fn hold_normalized(&mut self, output: ScratchFile) {
        self.normalized = Some(output);
    }

    fn cleanup(&mut self) {
        drop(self.upload.take());
        drop(self.normalized.take());
    }
}

impl Drop for TempArtifacts {
    fn drop(&mut self) {
        self.cleanup();
    }
}

pub struct TransformPipeline {
    readiness: Readiness,
    temp_store: TempStore,
    normalizer: Normalizer,
    styles: Arc<StyleCatalog>,
    generator: Arc<dyn GenerationClient>,
    results: ResultStore,
}

impl TransformPipeline {
    pub fn new(
        readiness: Readiness,
        temp_store: TempStore,
        normalizer: Normalizer,
        styles: Arc<StyleCatalog>,
        generator: Arc<dyn GenerationClient>,
        results: ResultStore,
    ) -> Self {
        Self {
            readiness,
            temp_store,
            normalizer,
            styles,
            generator,
            results,
        }
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness
    }

    pub fn styles(&self) -> &StyleCatalog {
        &self.styles
    }

    pub fn temp_store(&self) -> &TempStore {
        &self.temp_store
    }

    pub fn results(&self) -> &ResultStore {
        &self.results
    }

    /// Resolve a style key to its instruction; never fails
    pub fn resolve_style(&self, style_key: &str) -> TransformRequest {
        TransformRequest::resolve(&self.styles, style_key)
    }

    /// Run one upload through the whole pipeline.
    ///
    /// The upload file is owned by the pipeline from here on and is deleted
    /// before this returns, whatever the outcome.
    pub async fn run_transform(
        &self,
        upload: Option<UploadedAsset>,
        style_key: &str,
    ) -> Result<TransformOutcome, PipelineError> {
        let upload = upload.ok_or(PipelineError::NoFileProvided)?;
        let mut artifacts = TempArtifacts::new(upload.path.clone());

        if !self.readiness.credential_configured() {
            error!("❌ OpenAI API key missing during request!");
            return Err(PipelineError::Configuration(
                "OpenAI API key not configured".to_string(),
            ));
        }

        let request_id = Uuid::new_v4();

        info!(
            "📸 Processing image with style: {} (request {})",
            style_key, request_id
        );

        let result = self
            .execute(&upload, request_id, &mut artifacts, style_key)
            .await;
        artifacts.cleanup();

        match result {
            Ok(outcome) => {
                info!(
                    "💎 Transformation complete: {} (style {})",
                    outcome.image.id, outcome.resolved_style
                );
                Ok(outcome)
            }
            Err(e) => {
                warn!("❌ Transform {} failed: {}", request_id, e);
                Err(e.into())
            }
        }
    }

    async fn execute(
        &self,
        upload: &UploadedAsset,
        request_id: Uuid,
        artifacts: &mut TempArtifacts,
        style_key: &str,
    ) -> Result<TransformOutcome, TransformFailure> {
        let output = ScratchFile::new(self.temp_store.normalized_path(&request_id));
        let (normalized, output) = self.normalizer.normalize(upload, output).await;
        artifacts.hold_normalized(output);

        if let ConversionStatus::Passthrough(ref degraded) = normalized.status {
            warn!("{}", degraded);
        }

        let request = self.resolve_style(style_key);
        if request.used_fallback() {
            debug!(
                "Style '{}' unknown, using '{}'",
                request.style_key,
                request.resolved_key()
            );
        }

        let bytes = tokio::fs::read(&normalized.path)
            .await
            .map_err(|source| TransformFailure::ReadNormalized {
                path: normalized.path.clone(),
                source,
            })?;
        let image = InlineImage::from_bytes(&bytes, normalized.transport_mime());
        let source = if normalized.is_passthrough_of(&upload.path) {
            "original upload"
        } else {
            "normalized PNG"
        };
        debug!("📷 Sending {} as {}", source, image.mime_type());

        let generated = self
            .generator
            .generate(request.instruction_text(), &image)
            .await?;

        let stored = self.results.store(generated.bytes()).await?;

        Ok(TransformOutcome {
            image: stored,
            style: request.style_key.clone(),
            resolved_style: request.resolved_key().to_string(),
            converted: normalized.is_converted(),
        })
    }
}
