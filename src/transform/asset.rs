// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Values flowing through one transform request

use std::fmt;
use std::path::{Path, PathBuf};

use crate::styles::{StyleCatalog, StyleInstruction};
use crate::vision::PNG_MIME;

/// Raw upload sitting in the temporary store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedAsset {
    pub path: PathBuf,
    /// MIME type declared by the client
    pub mime_type: String,
    pub size_bytes: u64,
}

impl UploadedAsset {
    pub fn new(path: impl Into<PathBuf>, mime_type: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            path: path.into(),
            mime_type: mime_type.into(),
            size_bytes,
        }
    }
}

/// One conversion attempt that did not work out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedAttempt {
    pub strategy: &'static str,
    pub error: String,
}

/// Every conversion attempt failed and the original file is used as-is.
///
/// Never surfaced to callers; the pipeline logs it and carries on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizationDegraded {
    pub attempts: Vec<FailedAttempt>,
}

impl fmt::Display for NormalizationDegraded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "normalization degraded to passthrough")?;
        for attempt in &self.attempts {
            write!(f, "; {}: {}", attempt.strategy, attempt.error)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionStatus {
    /// Re-encoded to the canonical PNG by the named strategy
    Converted { strategy: &'static str },
    /// Original upload passed through untouched
    Passthrough(NormalizationDegraded),
}

/// Image handed to the generation step.
///
/// Always has a path and a MIME type: either the canonical PNG or the
/// original upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedAsset {
    pub path: PathBuf,
    pub mime_type: String,
    /// Pixel dimensions when converted
    pub dimensions: Option<(u32, u32)>,
    pub status: ConversionStatus,
}

impl NormalizedAsset {
    pub fn converted(path: impl Into<PathBuf>, side: u32, strategy: &'static str) -> Self {
        Self {
            path: path.into(),
            mime_type: PNG_MIME.to_string(),
            dimensions: Some((side, side)),
            status: ConversionStatus::Converted { strategy },
        }
    }

    pub fn passthrough(original: &UploadedAsset, degraded: NormalizationDegraded) -> Self {
        Self {
            path: original.path.clone(),
            mime_type: original.mime_type.clone(),
            dimensions: None,
            status: ConversionStatus::Passthrough(degraded),
        }
    }

    pub fn is_converted(&self) -> bool {
        matches!(self.status, ConversionStatus::Converted { .. })
    }

    /// True when this asset is just a reference to the given upload
    pub fn is_passthrough_of(&self, original: &Path) -> bool {
        !self.is_converted() && self.path == original
    }

    /// MIME type to declare to the generation service
    pub fn transport_mime(&self) -> &str {
        &self.mime_type
    }
}

/// Style key plus the instruction it resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformRequest {
    /// Key as requested by the caller
    pub style_key: String,
    pub instruction: StyleInstruction,
}

impl TransformRequest {
    /// Look the key up once; unknown keys get the default style
    pub fn resolve(catalog: &StyleCatalog, style_key: &str) -> Self {
        Self {
            style_key: style_key.to_string(),
            instruction: catalog.resolve(style_key).clone(),
        }
    }

    /// Instruction text sent to the generation service, placeholder untouched
    pub fn instruction_text(&self) -> &str {
        self.instruction.template()
    }

    /// Key of the style that actually applies
    pub fn resolved_key(&self) -> &str {
        self.instruction.key()
    }

    pub fn used_fallback(&self) -> bool {
        self.style_key != self.instruction.key()
    }
}
