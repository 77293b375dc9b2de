// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Generated Image Storage Module
//!
//! Persists generated images on disk under a fresh UUID and serves them back
//! by identifier. Stored images have no expiry; they live until purged
//! externally.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// File extension of every stored result
const RESULT_EXTENSION: &str = "png";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Image not found: {0}")]
    NotFound(String),

    #[error("Refusing to store an empty image")]
    EmptyPayload,

    #[error("Result {0} already exists")]
    Collision(ImageId),

    #[error("Storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Opaque, globally unique identifier of a stored image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(Uuid);

impl ImageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ImageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for ImageId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A persisted generation result
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub id: ImageId,
    pub path: PathBuf,
    pub size_bytes: usize,
}

/// Filesystem-backed store for generated images
#[derive(Debug, Clone)]
pub struct ResultStore {
    root: PathBuf,
}

impl ResultStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the results directory if it does not exist yet
    pub async fn ensure_dir(&self) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| StoreError::Io {
                path: self.root.clone(),
                source,
            })
    }

    /// Durable path for an identifier
    pub fn path_for(&self, id: &ImageId) -> PathBuf {
        self.root.join(format!("{}.{}", id, RESULT_EXTENSION))
    }

    /// Store image bytes under a freshly minted identifier.
    ///
    /// The file is opened with create-new semantics, so an existing result is
    /// never overwritten.
    pub async fn store(&self, bytes: &[u8]) -> Result<StoredImage, StoreError> {
        if bytes.is_empty() {
            return Err(StoreError::EmptyPayload);
        }

        let id = ImageId::new();
        let path = self.path_for(&id);
        debug!("📥 Storing result {} ({} bytes)", id, bytes.len());

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|source| {
                if source.kind() == io::ErrorKind::AlreadyExists {
                    StoreError::Collision(id)
                } else {
                    StoreError::Io {
                        path: path.clone(),
                        source,
                    }
                }
            })?;

        let write = async {
            file.write_all(bytes).await?;
            file.flush().await
        };
        if let Err(source) = write.await {
            // Do not leave a truncated result behind under a valid id
            let _ = tokio::fs::remove_file(&path).await;
            return Err(StoreError::Io { path, source });
        }

        info!("✅ Result stored: {}", id);
        Ok(StoredImage {
            id,
            path,
            size_bytes: bytes.len(),
        })
    }

    /// Look up stored bytes. Malformed identifiers are reported as not found,
    /// which also keeps arbitrary path segments out of the filesystem lookup.
    pub async fn retrieve(&self, id: &str) -> Result<Vec<u8>, StoreError> {
        let parsed = ImageId::from_str(id).map_err(|_| StoreError::NotFound(id.to_string()))?;
        let path = self.path_for(&parsed);

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("❌ No result found for {}", id);
                Err(StoreError::NotFound(id.to_string()))
            }
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    /// Check whether a result exists for an identifier
    pub async fn contains(&self, id: &str) -> bool {
        match ImageId::from_str(id) {
            Ok(parsed) => tokio::fs::try_exists(self.path_for(&parsed))
                .await
                .unwrap_or(false),
            Err(_) => false,
        }
    }
}
