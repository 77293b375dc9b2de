// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod config;
pub mod generation;
pub mod storage;
pub mod styles;
pub mod transform;
pub mod version;
pub mod vision;

pub use config::ServerConfig;
pub use generation::{GenerationClient, ResponsesClient};
pub use storage::{ImageId, ResultStore, TempStore};
pub use styles::StyleCatalog;
pub use transform::{PipelineError, Readiness, TransformOutcome, TransformPipeline};
