// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod errors;
pub mod handlers;
pub mod http_server;
pub mod transform;

pub use errors::{ApiError, ErrorResponse};
pub use handlers::{health_handler, result_handler, HealthResponse};
pub use http_server::{build_router, build_state, build_state_with_generator, start_server, AppState};
pub use transform::{transform_handler, TransformForm, TransformResponse};
