use chrono::Utc;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// A document written to a private temporary directory for one deployment.
///
/// Call [`StagedDocument::remove`] on the normal path. If the value is dropped
/// instead (an early return or a cancelled future) the directory is removed
/// synchronously in `Drop`. Removal failures are logged and otherwise ignored.
#[derive(Debug)]
pub struct StagedDocument {
    dir: Option<TempDir>,
    path: PathBuf,
    file_name: String,
}

impl StagedDocument {
    pub async fn create(
        staging_root: &Path,
        file_name: Option<&str>,
        content: &str,
    ) -> io::Result<Self> {
        tokio::fs::create_dir_all(staging_root).await?;
        let dir = tempfile::Builder::new()
            .prefix("deploy-")
            .tempdir_in(staging_root)?;
        let file_name = staged_file_name(file_name);
        let path = dir.path().join(&file_name);
        // On failure `dir` is dropped here and removes itself.
        tokio::fs::write(&path, content).await?;
        debug!(path = %path.display(), bytes = content.len(), "[STAGE] Wrote staged document");
        Ok(Self {
            dir: Some(dir),
            path,
            file_name,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Remove the staged directory without blocking the runtime.
    pub async fn remove(mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        let location = dir.keep();
        match tokio::fs::remove_dir_all(&location).await {
            Ok(()) => debug!(path = %location.display(), "[STAGE] Removed staged document"),
            Err(e) => warn!(
                error = ?e,
                path = %location.display(),
                "[STAGE] Failed to remove staged document"
            ),
        }
    }
}

impl Drop for StagedDocument {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let location = dir.path().to_path_buf();
            match dir.close() {
                Ok(()) => debug!(path = %location.display(), "[STAGE] Removed staged document"),
                Err(e) => warn!(
                    error = ?e,
                    path = %location.display(),
                    "[STAGE] Failed to remove staged document"
                ),
            }
        }
    }
}

/// Last path component of the requested name, or `resume-<millis>.html`.
pub fn staged_file_name(requested: Option<&str>) -> String {
    requested
        .and_then(|name| Path::new(name.trim()).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| format!("resume-{}.html", Utc::now().timestamp_millis()))
}
