use async_trait::async_trait;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StitchError {
    #[error("no audio files to stitch")]
    NoInput,
    #[error("media tool unavailable: {0}")]
    ToolUnavailable(String),
    #[error("media tool failed: {0}")]
    ToolFailed(String),
    #[error("stitched file was not created at {}", .0.display())]
    MissingOutput(PathBuf),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Concatenates per-chunk audio files, in the order given, into one file
#[async_trait]
pub trait AudioStitcher: Send + Sync {
    async fn stitch(&self, artifacts: &[PathBuf]) -> Result<PathBuf, StitchError>;

    async fn health_check(&self) -> Result<(), StitchError> {
        Ok(())
    }
}
