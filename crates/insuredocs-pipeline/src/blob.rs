// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Blob store: source PDFs and derived text artifacts on the filesystem.
//
// Every upload gets its own stored file named after its document id, so two
// records never share a source PDF or a text artifact, even for identical
// bytes. Text artifacts are written under a fixed subdirectory of the upload
// root and referenced by their path relative to that root.

use std::io::Write;
use std::path::{Component, Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use insuredocs_core::config::StorageConfig;
use insuredocs_core::error::{InsureDocsError, Result};
use insuredocs_core::DocumentId;

/// Operations the pipeline consumes.
pub trait BlobStore: Send + Sync {
    /// Absolute path of a stored PDF, or `InputMissing`.
    fn resolve_source(&self, stored_filename: &str) -> Result<PathBuf>;

    /// Relative artifact reference for a stored PDF.
    fn artifact_ref_for(&self, stored_filename: &str) -> String;

    fn write_text(&self, artifact_ref: &str, content: &str) -> Result<()>;

    fn read_text(&self, artifact_ref: &str) -> Result<String>;
}

/// Compute the SHA-256 hex digest of `data`.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Filesystem blob store rooted at the upload directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
    text_subdir: String,
}

impl FsBlobStore {
    /// Create the store, making sure the root exists.
    pub fn new(root: impl Into<PathBuf>, text_subdir: impl Into<String>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            text_subdir: text_subdir.into(),
        })
    }

    /// Build from storage settings; a relative `upload_dir` resolves against
    /// `base`.
    pub fn from_config(base: &Path, storage: &StorageConfig) -> Result<Self> {
        Self::new(base.join(&storage.upload_dir), storage.text_subdir.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store PDF bytes as `<document id>.pdf`, returning the stored filename.
    ///
    /// Refuses to overwrite an existing file.
    #[instrument(skip_all, fields(document_id = %id, bytes = data.len()))]
    pub fn store_pdf(&self, id: &DocumentId, data: &[u8]) -> Result<String> {
        let stored_filename = format!("{id}.pdf");
        let path = self.root.join(&stored_filename);

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)?;
        file.write_all(data)?;
        info!(stored_filename, sha256 = %hash_bytes(data), "PDF stored");
        Ok(stored_filename)
    }

    /// Remove a stored PDF and its text artifact. Files already gone are
    /// not an error.
    #[instrument(skip(self))]
    pub fn remove(&self, stored_filename: &str, artifact_ref: Option<&str>) -> Result<()> {
        remove_if_present(&self.contained(stored_filename)?)?;
        if let Some(artifact_ref) = artifact_ref {
            remove_if_present(&self.contained(artifact_ref)?)?;
        }
        Ok(())
    }

    /// Join a relative reference onto the root, refusing anything that would
    /// escape it.
    fn contained(&self, relative: &str) -> Result<PathBuf> {
        let rel = Path::new(relative);
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if relative.is_empty() || escapes {
            return Err(InsureDocsError::Config(format!(
                "blob reference '{relative}' must be a relative path inside the store"
            )));
        }
        Ok(self.root.join(rel))
    }
}

fn remove_if_present(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "blob removed");
            Ok(())
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

impl BlobStore for FsBlobStore {
    fn resolve_source(&self, stored_filename: &str) -> Result<PathBuf> {
        let path = self.contained(stored_filename)?;
        if !path.is_file() {
            return Err(InsureDocsError::InputMissing(path.display().to_string()));
        }
        Ok(path)
    }

    fn artifact_ref_for(&self, stored_filename: &str) -> String {
        let base = Path::new(stored_filename)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| stored_filename.to_owned());
        format!("{}/{}.txt", self.text_subdir, base)
    }

    #[instrument(skip(self, content), fields(bytes = content.len()))]
    fn write_text(&self, artifact_ref: &str, content: &str) -> Result<()> {
        let path = self.contained(artifact_ref)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;
        debug!(path = %path.display(), "text artifact written");
        Ok(())
    }

    fn read_text(&self, artifact_ref: &str) -> Result<String> {
        let path = self.contained(artifact_ref)?;
        Ok(std::fs::read_to_string(path)?)
    }
}
