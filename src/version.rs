// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the Restyle Node

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-restyle-pipeline-2025-10-16";

/// Semantic version number
pub const VERSION_NUMBER: &str = "0.1.0";

/// Build date
pub const BUILD_DATE: &str = "2025-10-16";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "multipart-upload",
    "png-normalization",
    "passthrough-fallback",
    "responses-image-generation",
    "result-retrieval",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Restyle Node {} ({})", VERSION_NUMBER, BUILD_DATE)
}
