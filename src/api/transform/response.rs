// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Transform response types

use serde::{Deserialize, Serialize};

use crate::transform::TransformOutcome;

/// Success message returned with every completed transform
pub const COMPLETION_MESSAGE: &str = "Sleaze transformation complete!";

/// Response from `POST /transform`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransformResponse {
    pub success: bool,
    /// Identifier to fetch the result from `GET /result/:id`
    pub image_id: String,
    /// Style key as requested by the client
    pub style: String,
    pub message: String,
}

impl From<&TransformOutcome> for TransformResponse {
    fn from(outcome: &TransformOutcome) -> Self {
        Self {
            success: true,
            image_id: outcome.image.id.to_string(),
            style: outcome.style.clone(),
            message: COMPLETION_MESSAGE.to_string(),
        }
    }
}
