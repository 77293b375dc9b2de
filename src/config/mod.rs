// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Process configuration, resolved once at startup
//!
//! Every option can be given as a flag or through the environment (a `.env`
//! file is honored by the binary).

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::generation::client::{
    ResponsesClientConfig, DEFAULT_BASE_URL, DEFAULT_IMAGE_DETAIL, DEFAULT_MODEL,
};
use crate::styles::{StyleCatalog, StyleError};
use crate::transform::{Readiness, CANONICAL_SIDE};
use crate::vision::image_utils::MAX_IMAGE_SIZE;

/// Upload size cap (10MB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("OPENAI_API_KEY environment variable is missing")]
    MissingCredential,

    #[error("Invalid configuration: {0}")]
    InvalidValue(String),

    #[error(transparent)]
    Styles(#[from] StyleError),
}

#[derive(Parser, Debug, Clone)]
#[command(name = "restyle-node")]
#[command(about = "Photo restyling service backed by an external image generator", long_about = None)]
pub struct ServerConfig {
    /// Interface to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// API key for the generation service
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub openai_base_url: String,

    /// Model used for the Responses API call
    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Detail level requested for the input image
    #[arg(long, env = "IMAGE_DETAIL", default_value = DEFAULT_IMAGE_DETAIL)]
    pub image_detail: String,

    /// Scratch directory for uploads and normalized intermediates
    #[arg(long, env = "UPLOADS_DIR", default_value = "uploads")]
    pub uploads_dir: PathBuf,

    /// Directory holding generated images
    #[arg(long, env = "RESULTS_DIR", default_value = "results")]
    pub results_dir: PathBuf,

    /// TOML style catalog replacing the built-in one
    #[arg(long, env = "STYLES_FILE")]
    pub styles_file: Option<PathBuf>,

    /// Maximum accepted upload size in bytes
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,

    /// Optional timeout for the generation call, in seconds
    #[arg(long, env = "GENERATION_TIMEOUT_SECS")]
    pub generation_timeout_secs: Option<u64>,

    /// Side of the canonical square the uploads are resized to
    #[arg(long, env = "CANONICAL_SIZE", default_value_t = CANONICAL_SIDE)]
    pub canonical_size: u32,
}

impl ServerConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The configured credential, ignoring blank values
    pub fn api_key(&self) -> Option<&str> {
        self.openai_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    pub fn readiness(&self) -> Readiness {
        Readiness::from_credential(self.api_key())
    }

    /// Startup checks; a missing credential is fatal
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key().is_none() {
            return Err(ConfigError::MissingCredential);
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::InvalidValue(
                "max_upload_bytes must be greater than 0".to_string(),
            ));
        }
        if self.max_upload_bytes > MAX_IMAGE_SIZE {
            return Err(ConfigError::InvalidValue(format!(
                "max_upload_bytes must not exceed {} (in-memory decode limit)",
                MAX_IMAGE_SIZE
            )));
        }
        if self.canonical_size == 0 {
            return Err(ConfigError::InvalidValue(
                "canonical_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Settings for the generation client, or `None` without a credential
    pub fn generation_config(&self) -> Option<ResponsesClientConfig> {
        self.api_key().map(|key| ResponsesClientConfig {
            base_url: self.openai_base_url.clone(),
            api_key: key.to_string(),
            model: self.model.clone(),
            image_detail: self.image_detail.clone(),
            timeout: self.generation_timeout_secs.map(Duration::from_secs),
        })
    }

    pub fn load_styles(&self) -> Result<StyleCatalog, ConfigError> {
        let catalog = match &self.styles_file {
            Some(path) => StyleCatalog::load(path)?,
            None => StyleCatalog::builtin()?,
        };
        Ok(catalog)
    }
}
