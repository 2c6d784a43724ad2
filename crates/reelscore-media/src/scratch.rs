//! Scoped scratch storage for one pipeline run.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::error::MediaResult;

/// Temporary working directory removed when dropped.
///
/// Holds `frames/` and `audio/` subdirectories for one run. Dropping the value
/// on any exit path, including early returns with `?`, deletes everything.
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    /// Create a fresh scratch directory under `root`.
    pub async fn create(root: impl AsRef<Path>, label: &str) -> MediaResult<Self> {
        let root = root.as_ref();
        tokio::fs::create_dir_all(root).await?;

        let dir = tempfile::Builder::new()
            .prefix(&format!("{}-", label))
            .tempdir_in(root)?;
        tokio::fs::create_dir_all(dir.path().join("frames")).await?;
        tokio::fs::create_dir_all(dir.path().join("audio")).await?;

        debug!(path = %dir.path().display(), "Created scratch directory");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn frames_dir(&self) -> PathBuf {
        self.dir.path().join("frames")
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.dir.path().join("audio")
    }
}
