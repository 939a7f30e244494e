use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

/// Failure removing a single stale entry. Only ever logged.
#[derive(Debug, thiserror::Error)]
#[error("failed to clean up {}: {source}", path.display())]
struct CleanupError {
    path: PathBuf,
    #[source]
    source: std::io::Error,
}

/// Delete every entry of `dir` whose modification time is at least `max_age`
/// old. Returns how many entries were removed.
///
/// Never fails: a missing directory is a no-op and per-entry errors are
/// logged and skipped.
pub async fn cleanup_older_than(dir: &Path, max_age: Duration) -> usize {
    cleanup_dir(dir, max_age, &InUsePaths::default()).await
}

async fn cleanup_dir(dir: &Path, max_age: Duration, in_use: &InUsePaths) -> usize {
    let Some(cutoff) = SystemTime::now().checked_sub(max_age) else {
        return 0;
    };

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return 0,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "Failed to list directory for cleanup");
            return 0;
        }
    };

    let mut removed = 0;
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "Failed to read directory entry");
                break;
            }
        };

        let path = entry.path();
        if in_use.contains(&path) {
            tracing::debug!(path = %path.display(), "Skipping artifact held by a running job");
            continue;
        }

        match remove_if_stale(&path, cutoff).await {
            Ok(true) => removed += 1,
            Ok(false) => {}
            Err(e) => tracing::warn!(error = %e, "Cleanup failed"),
        }
    }

    if removed > 0 {
        tracing::info!(dir = %dir.display(), removed, "Removed stale artifacts");
    }

    removed
}

async fn remove_if_stale(path: &Path, cutoff: SystemTime) -> Result<bool, CleanupError> {
    let wrap = |source| CleanupError {
        path: path.to_path_buf(),
        source,
    };

    let metadata = tokio::fs::symlink_metadata(path).await.map_err(wrap)?;
    let modified = metadata.modified().map_err(wrap)?;
    if modified > cutoff {
        return Ok(false);
    }

    if metadata.is_dir() {
        tokio::fs::remove_dir_all(path).await.map_err(wrap)?;
    } else {
        tokio::fs::remove_file(path).await.map_err(wrap)?;
    }

    tracing::debug!(path = %path.display(), "Removed stale artifact");
    Ok(true)
}

/// Paths a sweep must leave alone, whatever their age
#[derive(Debug, Clone, Default)]
struct InUsePaths(Arc<Mutex<HashSet<PathBuf>>>);

impl InUsePaths {
    fn lock(&self) -> MutexGuard<'_, HashSet<PathBuf>> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn contains(&self, path: &Path) -> bool {
        self.lock().contains(path)
    }
}

/// Keeps a path out of every sweep until dropped
#[derive(Debug)]
pub struct InUseGuard {
    paths: InUsePaths,
    path: PathBuf,
}

impl Drop for InUseGuard {
    fn drop(&mut self) {
        self.paths.lock().remove(&self.path);
    }
}

/// Directories swept after every completed job, each with its own age limit
#[derive(Debug, Clone, Default)]
pub struct ArtifactJanitor {
    targets: Vec<(PathBuf, Duration)>,
    in_use: InUsePaths,
}

impl ArtifactJanitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target(mut self, dir: impl Into<PathBuf>, max_age: Duration) -> Self {
        self.targets.push((dir.into(), max_age));
        self
    }

    /// Exclude `path` from sweeps for as long as the guard lives
    pub fn hold(&self, path: impl Into<PathBuf>) -> InUseGuard {
        let path = path.into();
        self.in_use.lock().insert(path.clone());
        InUseGuard {
            paths: self.in_use.clone(),
            path,
        }
    }

    /// Best-effort pass over every target
    pub async fn sweep(&self) -> usize {
        let mut removed = 0;
        for (dir, max_age) in &self.targets {
            removed += cleanup_dir(dir, *max_age, &self.in_use).await;
        }
        removed
    }
}
