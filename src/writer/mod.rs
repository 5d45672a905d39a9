//! Staging directory and the writer that populates it

use crate::catalog::RuntimeType;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Prefix of every staging directory and archive name
pub const STAGING_PREFIX: &str = "cf-support";

/// Replace characters that would escape the intended directory
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect()
}

/// Transient directory tree that accumulates one run's artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingDir {
    root: PathBuf,
}

impl StagingDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `{base}/cf-support-{runtime}-{timestamp}`
    pub fn timestamped(base: &Path, runtime: RuntimeType, at: DateTime<Utc>) -> Self {
        let name = format!("{}-{}-{}", STAGING_PREFIX, runtime.slug(), at.format("%Y-%m-%dT%H-%M-%SZ"));
        Self::new(base.join(name))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Final path component, used to name the archive
    pub fn name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| STAGING_PREFIX.to_string())
    }

    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    pub async fn create(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// `{root}/{kind}/{item}{suffix}`
    pub fn item_path(&self, kind: &str, item: &str, suffix: &str) -> PathBuf {
        self.root
            .join(sanitize(kind))
            .join(format!("{}{}", sanitize(item), suffix))
    }

    /// `{root}/{file}`
    pub fn root_file(&self, file: &str) -> PathBuf {
        self.root.join(sanitize(file))
    }

    pub fn writer(&self) -> ResourceWriter {
        ResourceWriter
    }
}

/// Writes artifacts, creating parent directories on demand
///
/// Writes are not transactional: a failed run leaves whatever was written so
/// far and is simply re-run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceWriter;

impl ResourceWriter {
    pub async fn write_text(&self, path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, content).await?;
        trace!(path = %path.display(), bytes = content.len(), "wrote artifact");
        Ok(())
    }

    pub async fn write_yaml<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        let content = serde_yaml::to_string(value)?;
        self.write_text(path, &content).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamped_name() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 8, 7).unwrap();
        let staging = StagingDir::timestamped(Path::new("/tmp"), RuntimeType::GitOps, at);
        assert_eq!(staging.root(), Path::new("/tmp/cf-support-gitops-2024-05-01T09-08-07Z"));
        assert_eq!(staging.name(), "cf-support-gitops-2024-05-01T09-08-07Z");
    }

    #[test]
    fn test_item_path_is_sanitized() {
        let staging = StagingDir::new("/stage");
        assert_eq!(
            staging.item_path("Pods", "runner/evil", "_describe.txt"),
            PathBuf::from("/stage/Pods/runner_evil_describe.txt")
        );
    }

    #[tokio::test]
    async fn test_write_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let staging = StagingDir::new(dir.path().join("stage"));
        let path = staging.item_path("Nodes", "node-1", "_describe.txt");

        staging.writer().write_text(&path, "hello").await.unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "hello");
    }
}
