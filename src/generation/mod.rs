// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image generation through an external OpenAI-compatible service

pub mod client;

pub use client::{
    extract_generated_image, GenerationClient, GenerationError, GenerationResult, InlineImage,
    OutputItem, ResponsesApiResponse, ResponsesClient, ResponsesClientConfig,
};
