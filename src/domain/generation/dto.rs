use serde::Serialize;
use std::path::PathBuf;

/// Extras some backends need on top of the text and voice
#[derive(Debug, Clone, Default)]
pub struct SynthesisOptions {
    /// Recording whose voice should be cloned
    pub reference_audio: Option<PathBuf>,
    pub language: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub text: String,
    pub voice_model_id: String,
    pub options: SynthesisOptions,
}

impl GenerationRequest {
    pub fn new(text: impl Into<String>, voice_model_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice_model_id: voice_model_id.into(),
            options: SynthesisOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SynthesisOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub final_artifact_path: PathBuf,
    pub summary_message: String,
    pub chunk_count: usize,
    pub character_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationEstimate {
    pub chunk_count: usize,
    pub estimated_duration_minutes: u64,
}
