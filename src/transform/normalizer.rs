// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Upload normalization to a canonical square PNG
//!
//! Strategies are tried in order until one converts the image. If none does,
//! the original upload is passed through unchanged, so this step never fails.

use std::path::Path;

use tracing::{debug, info, warn};

use super::asset::{FailedAttempt, NormalizationDegraded, NormalizedAsset, UploadedAsset};
use crate::storage::{ScratchFile, TempStore};
use crate::vision::{
    decode_image_bytes, decode_image_path, encode_png, format_to_extension, resize_square,
    ImageError,
};

/// Side length of the canonical square, in pixels
pub const CANONICAL_SIDE: u32 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeStrategy {
    /// Decode straight from the file path (format taken from the extension)
    DecodeFromPath,
    /// Read the file into memory and decode from the buffer (format sniffed
    /// from the content)
    DecodeFromMemory,
    /// Use the original upload untouched; cannot fail
    Passthrough,
}

impl NormalizeStrategy {
    pub const DEFAULT_ORDER: [NormalizeStrategy; 3] = [
        NormalizeStrategy::DecodeFromPath,
        NormalizeStrategy::DecodeFromMemory,
        NormalizeStrategy::Passthrough,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            NormalizeStrategy::DecodeFromPath => "decode_from_path",
            NormalizeStrategy::DecodeFromMemory => "decode_from_memory",
            NormalizeStrategy::Passthrough => "passthrough",
        }
    }

    fn convert(&self, input: &Path, output: &Path, side: u32) -> Result<(), ImageError> {
        let img = match self {
            NormalizeStrategy::DecodeFromPath => decode_image_path(input)?,
            NormalizeStrategy::DecodeFromMemory => {
                let bytes = std::fs::read(input)?;
                let (img, info) = decode_image_bytes(&bytes)?;
                debug!(
                    "Content sniffed as {} ({}x{}, {} bytes)",
                    format_to_extension(info.format),
                    info.width,
                    info.height,
                    info.size_bytes
                );
                img
            }
            NormalizeStrategy::Passthrough => return Ok(()),
        };

        // Encode fully in memory first so a failed encode writes nothing
        let png = encode_png(&resize_square(&img, side))?;
        if let Err(e) = std::fs::write(output, png) {
            TempStore::remove_if_exists(output);
            return Err(e.into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    side: u32,
    strategies: Vec<NormalizeStrategy>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(CANONICAL_SIDE)
    }
}

impl Normalizer {
    pub fn new(side: u32) -> Self {
        Self {
            side,
            strategies: NormalizeStrategy::DEFAULT_ORDER.to_vec(),
        }
    }

    /// Use a custom strategy order. Anything listed after `Passthrough` is
    /// unreachable and dropped; `Passthrough` is appended when missing.
    pub fn with_strategies(side: u32, strategies: Vec<NormalizeStrategy>) -> Self {
        let mut ordered: Vec<NormalizeStrategy> = strategies
            .into_iter()
            .take_while(|s| *s != NormalizeStrategy::Passthrough)
            .collect();
        ordered.push(NormalizeStrategy::Passthrough);
        Self {
            side,
            strategies: ordered,
        }
    }

    pub fn side(&self) -> u32 {
        self.side
    }

    pub fn strategies(&self) -> &[NormalizeStrategy] {
        &self.strategies
    }

    /// Normalize on the blocking pool; decoding and encoding are CPU-bound.
    ///
    /// The output guard travels with the blocking task and is handed back
    /// with the result, so a dropped caller never leaves the output behind.
    pub async fn normalize(
        &self,
        input: &UploadedAsset,
        output: ScratchFile,
    ) -> (NormalizedAsset, ScratchFile) {
        let this = self.clone();
        let owned_input = input.clone();
        let output_path = output.path().to_path_buf();

        let task = tokio::task::spawn_blocking(move || {
            let asset = this.normalize_blocking(&owned_input, output.path());
            (asset, output)
        });

        match task.await {
            Ok(done) => done,
            Err(e) => {
                warn!("Normalization task aborted: {}", e);
                let asset = NormalizedAsset::passthrough(
                    input,
                    NormalizationDegraded {
                        attempts: vec![FailedAttempt {
                            strategy: "blocking_task",
                            error: e.to_string(),
                        }],
                    },
                );
                (asset, ScratchFile::new(output_path))
            }
        }
    }

    /// Run the strategies in order on the current thread
    pub fn normalize_blocking(&self, input: &UploadedAsset, output: &Path) -> NormalizedAsset {
        let mut degraded = NormalizationDegraded::default();

        for strategy in &self.strategies {
            if *strategy == NormalizeStrategy::Passthrough {
                break;
            }

            debug!(
                "Normalizing {} with {}",
                input.path.display(),
                strategy.name()
            );
            match strategy.convert(&input.path, output, self.side) {
                Ok(()) => {
                    info!(
                        "🖼️ Image converted to {}x{} PNG ({})",
                        self.side,
                        self.side,
                        strategy.name()
                    );
                    return NormalizedAsset::converted(output, self.side, strategy.name());
                }
                Err(e) => {
                    warn!("⚠️ {} failed for {}: {}", strategy.name(), input.path.display(), e);
                    degraded.attempts.push(FailedAttempt {
                        strategy: strategy.name(),
                        error: e.to_string(),
                    });
                }
            }
        }

        warn!("❌ All conversion attempts failed, using original file: {}", degraded);
        NormalizedAsset::passthrough(input, degraded)
    }
}
