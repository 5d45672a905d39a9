//! Archiving and removal of the staging directory

use crate::error::{Result, SupportError};
use crate::writer::StagingDir;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Encodes a directory tree into one archive file
pub trait Compressor: Send + Sync {
    /// Write an archive of `source` to `dest`
    fn compress(&self, source: &Path, dest: &Path) -> Result<()>;

    /// File extension of produced archives, without the leading dot
    fn extension(&self) -> &str;
}

/// gzip-compressed tarball whose entries are rooted at the directory's own name
#[derive(Debug, Clone, Copy, Default)]
pub struct TarGzCompressor;

impl Compressor for TarGzCompressor {
    fn compress(&self, source: &Path, dest: &Path) -> Result<()> {
        let root = source
            .file_name()
            .ok_or_else(|| SupportError::InvalidArgument(format!("cannot archive {}", source.display())))?;

        let file = File::create(dest)?;
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        builder.append_dir_all(root, source)?;
        builder.into_inner()?.finish()?;
        Ok(())
    }

    fn extension(&self) -> &str {
        "tar.gz"
    }
}

/// Final stage of a run: archive, then remove the staging tree
#[derive(Clone)]
pub struct PackagingStage {
    compressor: Arc<dyn Compressor>,
}

impl Default for PackagingStage {
    fn default() -> Self {
        Self::new(Arc::new(TarGzCompressor))
    }
}

impl PackagingStage {
    pub fn new(compressor: Arc<dyn Compressor>) -> Self {
        Self { compressor }
    }

    /// `{parent}/{name}.{ext}` for a staging directory
    pub fn archive_path(&self, staging: &StagingDir) -> PathBuf {
        let parent = staging.root().parent().unwrap_or_else(|| Path::new("."));
        parent.join(format!("{}.{}", staging.name(), self.compressor.extension()))
    }

    /// Archive the staging tree; the tree is left untouched either way
    ///
    /// On failure no archive is left behind.
    pub async fn archive(&self, staging: &StagingDir) -> Result<PathBuf> {
        let dest = self.archive_path(staging);
        let failed = |reason: String| SupportError::ArchivalFailed {
            staging: staging.root().to_path_buf(),
            reason,
        };

        if !staging.exists() {
            return Err(failed("staging directory does not exist".to_string()));
        }

        let compressor = self.compressor.clone();
        let source = staging.root().to_path_buf();
        let target = dest.clone();
        let compressed = tokio::task::spawn_blocking(move || compressor.compress(&source, &target))
            .await
            .map_err(|e| failed(e.to_string()))
            .and_then(|r| r.map_err(|e| failed(e.to_string())));

        if let Err(e) = compressed {
            // Drop any partial archive
            match tokio::fs::remove_file(&dest).await {
                Ok(()) => warn!(archive = %dest.display(), "removed partial archive"),
                Err(rm) if rm.kind() == std::io::ErrorKind::NotFound => {}
                Err(rm) => warn!(archive = %dest.display(), error = %rm, "could not remove partial archive"),
            }
            return Err(e);
        }

        info!(archive = %dest.display(), "archive created");
        Ok(dest)
    }

    /// Remove the staging tree
    pub async fn cleanup(&self, staging: &StagingDir) -> Result<()> {
        tokio::fs::remove_dir_all(staging.root()).await?;
        info!(staging = %staging.root().display(), "staging directory removed");
        Ok(())
    }

    /// Archive, and remove the staging tree only if archiving succeeded
    ///
    /// A failed cleanup is not fatal: the archive already exists.
    pub async fn finalize(&self, staging: &StagingDir) -> Result<PathBuf> {
        let archive = self.archive(staging).await?;
        if let Err(e) = self.cleanup(staging).await {
            warn!(staging = %staging.root().display(), error = %e, "could not remove staging directory");
        }
        Ok(archive)
    }
}
