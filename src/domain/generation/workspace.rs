use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Job-scoped scratch directory holding the per-chunk audio files.
///
/// Each generation run gets its own directory, so chunk files derived from
/// the chunk index never collide across concurrent jobs.
#[derive(Debug)]
pub struct JobWorkspace {
    id: Uuid,
    dir: PathBuf,
}

impl JobWorkspace {
    pub async fn create(temp_root: &Path) -> io::Result<Self> {
        let id = Uuid::new_v4();
        let dir = temp_root.join(format!("job_{}", id.simple()));
        tokio::fs::create_dir_all(&dir).await?;

        Ok(Self { id, dir })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Deterministic artifact path for a chunk, e.g. `chunk_0007.wav`
    pub fn chunk_path(&self, index: usize, extension: &str) -> PathBuf {
        self.dir.join(format!("chunk_{:04}.{}", index, extension))
    }

    /// Copy a reference recording into the workspace, keeping its extension
    pub async fn adopt_reference(&self, source: &Path) -> io::Result<PathBuf> {
        let extension = source
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("wav");
        let target = self.dir.join(format!("reference.{}", extension));
        tokio::fs::copy(source, &target).await?;
        Ok(target)
    }

    /// Delete the directory and every artifact in it
    pub async fn remove(&self) -> io::Result<()> {
        match tokio::fs::remove_dir_all(&self.dir).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}
