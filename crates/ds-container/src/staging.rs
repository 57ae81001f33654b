use std::path::{Path, PathBuf};

use ds_session::sentinel::new_temp_name;
use tracing::{debug, warn};

/// A uniquely named host path used to stage one transfer.
///
/// Call [`StagedPath::cleanup`] to remove whatever ended up at the path,
/// file or directory, without blocking the runtime. Dropping the guard
/// without it removes the object synchronously.
#[derive(Debug)]
pub struct StagedPath {
    path: PathBuf,
    cleaned: bool,
}

impl StagedPath {
    pub fn new(dir: &Path, namespace: &str) -> Self {
        Self {
            path: dir.join(new_temp_name(namespace)),
            cleaned: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn cleanup(mut self) -> std::io::Result<()> {
        let result = match tokio::fs::symlink_metadata(&self.path).await {
            Ok(meta) if meta.is_dir() => tokio::fs::remove_dir_all(&self.path).await,
            Ok(_) => tokio::fs::remove_file(&self.path).await,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        };
        if result.is_ok() {
            self.cleaned = true;
            debug!(path = %self.path.display(), "cleaned up staged object");
        }
        result
    }
}

impl Drop for StagedPath {
    fn drop(&mut self) {
        if self.cleaned {
            return;
        }
        let result = match std::fs::symlink_metadata(&self.path) {
            Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(&self.path),
            Ok(_) => std::fs::remove_file(&self.path),
            Err(_) => return,
        };
        match result {
            Ok(()) => debug!(path = %self.path.display(), "removed staged object"),
            Err(e) => warn!(path = %self.path.display(), "failed to remove staged object: {e}"),
        }
    }
}
