// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Scratch directory for raw uploads and normalized intermediates
//!
//! Every file name is derived from a fresh UUID, so concurrent requests never
//! share a path and no locking is needed.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::vision::image_utils::mime_to_extension;

/// Suffix appended to the request id for the normalized PNG
const CONVERTED_SUFFIX: &str = "_converted.png";

/// A scratch file that is deleted when the guard drops.
///
/// The guard can be moved into a blocking task together with the work that
/// writes the file. If the awaiting future is gone by the time the task
/// finishes, the task output is dropped and the file goes with it.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
    armed: bool,
}

impl ScratchFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            armed: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Disarm the guard and hand the path to the caller
    pub fn keep(mut self) -> PathBuf {
        self.armed = false;
        std::mem::take(&mut self.path)
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if self.armed {
            TempStore::remove_if_exists(&self.path);
        }
    }
}

#[derive(Debug, Clone)]
pub struct TempStore {
    root: PathBuf,
}

impl TempStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the scratch directory if it does not exist yet
    pub async fn ensure_dir(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    /// Pick a fresh path for an upload, keeping the client's file extension
    /// when there is one and otherwise deriving it from the declared MIME type.
    pub fn upload_path(&self, original_name: Option<&str>, mime_type: &str) -> PathBuf {
        let ext = original_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|ext| ext.to_ascii_lowercase())
            .or_else(|| mime_to_extension(mime_type).map(str::to_string));

        let name = match ext {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };
        self.root.join(name)
    }

    /// Write raw upload bytes to a fresh path and return that path
    pub async fn write_upload(
        &self,
        bytes: &[u8],
        original_name: Option<&str>,
        mime_type: &str,
    ) -> io::Result<PathBuf> {
        let scratch = ScratchFile::new(self.upload_path(original_name, mime_type));
        let data = bytes.to_vec();

        // A failed or unclaimed write drops the guard, which removes the file
        let written = tokio::task::spawn_blocking(move || -> io::Result<ScratchFile> {
            std::fs::write(scratch.path(), &data)?;
            Ok(scratch)
        })
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))??;

        let path = written.keep();
        debug!("Upload written to {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }

    /// Path reserved for the normalized output of one request
    pub fn normalized_path(&self, request_id: &Uuid) -> PathBuf {
        self.root.join(format!("{}{}", request_id, CONVERTED_SUFFIX))
    }

    /// Delete a file, treating "already gone" as success.
    ///
    /// Returns `true` when a file was actually removed.
    pub fn remove_if_exists(path: &Path) -> bool {
        match std::fs::remove_file(path) {
            Ok(()) => {
                debug!("🧹 Removed temporary file {}", path.display());
                true
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => {
                warn!("Failed to remove temporary file {}: {}", path.display(), e);
                false
            }
        }
    }
}
