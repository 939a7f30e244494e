use std::path::PathBuf;

/// Why a backend failed to turn a chunk into audio
#[derive(Debug, thiserror::Error)]
pub enum SynthesisFailure {
    #[error("process exited unsuccessfully ({status}): {diagnostics}")]
    ProcessFailed { status: String, diagnostics: String },
    #[error("could not parse process output: {0}")]
    ParseFailure(String),
    #[error("{0}")]
    Reported(String),
    #[error("audio file was not created at {}", .0.display())]
    MissingOutput(PathBuf),
    #[error("{0}")]
    Request(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum TtsError {
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("synthesis failed: {0}")]
    SynthesisFailed(#[from] SynthesisFailure),
    #[error("invalid voice model: {0}")]
    InvalidVoiceModel(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
}

impl From<std::io::Error> for TtsError {
    fn from(err: std::io::Error) -> Self {
        TtsError::SynthesisFailed(SynthesisFailure::Io(err))
    }
}
