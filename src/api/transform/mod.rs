// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Photo transform API endpoint module
//!
//! Provides POST /transform for restyling an uploaded photo.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::transform_handler;
pub use request::{TransformForm, UploadedFile, IMAGE_FIELD, STYLE_FIELD};
pub use response::TransformResponse;
