use crate::error::AppError;
use crate::infrastructure::media::StitchError;
use crate::infrastructure::repositories::TtsError;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("text produced no chunks to synthesize")]
    EmptyInput,
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
    /// Provider backpressure. Not retried automatically.
    #[error("rate limited while generating chunk {chunk_index}: {message}")]
    RateLimited { chunk_index: usize, message: String },
    #[error("failed to generate audio for chunk {chunk_index}: {source}")]
    SynthesisFailed {
        chunk_index: usize,
        #[source]
        source: TtsError,
    },
    #[error("failed to stitch audio files: {0}")]
    StitchFailed(#[from] StitchError),
    #[error("job workspace error: {0}")]
    Workspace(#[from] std::io::Error),
}

impl GenerationError {
    /// Attribute a backend failure to the chunk that triggered it
    pub fn from_backend(chunk_index: usize, source: TtsError) -> Self {
        match source {
            TtsError::RateLimited(message) => Self::RateLimited {
                chunk_index,
                message,
            },
            source => Self::SynthesisFailed {
                chunk_index,
                source,
            },
        }
    }
}

impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        let message = err.to_string();
        match err {
            GenerationError::InvalidInput(msg) => AppError::BadRequest(msg),
            GenerationError::EmptyInput => AppError::BadRequest(message),
            GenerationError::BackendUnavailable(_) => AppError::ServiceUnavailable(message),
            GenerationError::RateLimited { .. } => AppError::RateLimitExceeded(message),
            GenerationError::SynthesisFailed { source, .. } => match source {
                TtsError::RateLimited(_) => AppError::RateLimitExceeded(message),
                TtsError::BackendUnavailable(_) => AppError::ServiceUnavailable(message),
                TtsError::InvalidVoiceModel(_) => AppError::BadRequest(message),
                TtsError::SynthesisFailed(_) => AppError::ExternalService(message),
            },
            GenerationError::StitchFailed(_) => AppError::ExternalService(message),
            GenerationError::Workspace(_) => AppError::Internal(message),
        }
    }
}
