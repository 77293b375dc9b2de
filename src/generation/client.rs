// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image-to-image generation via the OpenAI Responses API
//!
//! The request carries the style instruction plus the photo as an inline data
//! URL and asks for the `image_generation` tool. The response is an ordered
//! list of output items; the first `image_generation_call` item holds the
//! produced image as base64.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

/// Output item type carrying a generated image
pub const IMAGE_GENERATION_CALL: &str = "image_generation_call";

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";
pub const DEFAULT_IMAGE_DETAIL: &str = "high";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("No image generated in response")]
    NoImageInResponse,

    #[error("Generated image payload is empty")]
    EmptyImage,

    #[error("Generated image is not valid base64: {0}")]
    InvalidImageEncoding(#[from] base64::DecodeError),

    #[error("Generation service returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Generation request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unreadable generation response: {0}")]
    InvalidResponse(String),
}

impl GenerationError {
    /// True when the service answered but produced nothing usable
    pub fn is_unusable_output(&self) -> bool {
        matches!(
            self,
            GenerationError::NoImageInResponse
                | GenerationError::EmptyImage
                | GenerationError::InvalidImageEncoding(_)
        )
    }
}

/// Image attached to a generation request, already base64-encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    mime_type: String,
    base64: String,
}

impl InlineImage {
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            base64: STANDARD.encode(bytes),
        }
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn base64(&self) -> &str {
        &self.base64
    }

    /// `data:<mime>;base64,<payload>`
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }
}

/// Produced image bytes; never empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    bytes: Vec<u8>,
}

impl GenerationResult {
    pub fn new(bytes: Vec<u8>) -> Result<Self, GenerationError> {
        if bytes.is_empty() {
            return Err(GenerationError::EmptyImage);
        }
        Ok(Self { bytes })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// The external generation capability
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generate one image from an instruction and a source image.
    ///
    /// The instruction is opaque text and is sent verbatim.
    async fn generate(
        &self,
        instruction: &str,
        image: &InlineImage,
    ) -> Result<GenerationResult, GenerationError>;
}

// --- Responses API wire types ---

#[derive(Debug, Deserialize)]
pub struct ResponsesApiResponse {
    #[serde(default)]
    pub output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
pub struct OutputItem {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub result: Option<String>,
}

/// Pull the generated image out of a parsed response.
///
/// Only the first `image_generation_call` item is considered.
pub fn extract_generated_image(
    response: ResponsesApiResponse,
) -> Result<GenerationResult, GenerationError> {
    let first = response
        .output
        .into_iter()
        .find(|item| item.kind == IMAGE_GENERATION_CALL)
        .ok_or(GenerationError::NoImageInResponse)?;

    let payload = first.result.unwrap_or_default();
    if payload.trim().is_empty() {
        return Err(GenerationError::EmptyImage);
    }

    let bytes = STANDARD.decode(payload.trim())?;
    GenerationResult::new(bytes)
}

/// Settings for [`ResponsesClient`]
#[derive(Debug, Clone)]
pub struct ResponsesClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub image_detail: String,
    /// No timeout is applied when `None`; callers rely on deployment limits
    pub timeout: Option<Duration>,
}

impl ResponsesClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            image_detail: DEFAULT_IMAGE_DETAIL.to_string(),
            timeout: None,
        }
    }
}

/// Client for the OpenAI Responses API
pub struct ResponsesClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model_name: String,
    image_detail: String,
}

impl ResponsesClient {
    pub fn new(config: ResponsesClientConfig) -> Result<Self, GenerationError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        let endpoint = format!("{}/responses", config.base_url.trim_end_matches('/'));
        info!(
            "Generation client configured: endpoint={}, model={}",
            endpoint, config.model
        );

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key,
            model_name: config.model,
            image_detail: config.image_detail,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// JSON body for one generation request
    pub fn request_payload(&self, instruction: &str, image: &InlineImage) -> serde_json::Value {
        serde_json::json!({
            "model": self.model_name,
            "input": [
                {
                    "role": "user",
                    "content": [
                        { "type": "input_text", "text": instruction },
                        {
                            "type": "input_image",
                            "image_url": image.data_url(),
                            "detail": self.image_detail,
                        }
                    ]
                }
            ],
            "tools": [{ "type": "image_generation" }]
        })
    }
}

#[async_trait]
impl GenerationClient for ResponsesClient {
    async fn generate(
        &self,
        instruction: &str,
        image: &InlineImage,
    ) -> Result<GenerationResult, GenerationError> {
        let start = Instant::now();
        let body = self.request_payload(instruction, image);

        debug!(
            "Generation POST {} (mime={}, {} base64 chars)",
            self.endpoint,
            image.mime_type(),
            image.base64().len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(GenerationError::Upstream {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: ResponsesApiResponse = serde_json::from_str(&text)
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;
        let item_count = parsed.output.len();
        let result = extract_generated_image(parsed)?;

        info!(
            "✨ Image generated: model={}, {} output items, {} bytes, {}ms",
            self.model_name,
            item_count,
            result.len(),
            start.elapsed().as_millis()
        );

        Ok(result)
    }
}
