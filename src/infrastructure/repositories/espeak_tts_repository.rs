use super::tts_error::{SynthesisFailure, TtsError};
use super::tts_repository::TtsRepository;
use crate::domain::chunking::TextChunk;
use crate::domain::generation::{JobWorkspace, SynthesisOptions};
use crate::infrastructure::process::run_process;
use async_trait::async_trait;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::PathBuf;

const DEFAULT_ESPEAK_VOICE: &str = "en+f3";
const DEFAULT_WORDS_PER_MINUTE: u32 = 150;

/// System speech synthesizer (espeak) implementation of TTS repository
pub struct EspeakTtsRepository {
    espeak_path: PathBuf,
    voice_map: HashMap<String, String>,
    words_per_minute: u32,
}

impl EspeakTtsRepository {
    pub fn new(espeak_path: PathBuf) -> Self {
        let voice_map = HashMap::from([("fallback-narrator-1".to_string(), "en+f3".to_string())]);

        Self {
            espeak_path,
            voice_map,
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
        }
    }

    pub fn with_voice(mut self, voice_model_id: impl Into<String>, espeak_voice: impl Into<String>) -> Self {
        self.voice_map.insert(voice_model_id.into(), espeak_voice.into());
        self
    }

    /// Map a catalog voice to an espeak voice, falling back to the default
    fn voice_for(&self, voice_model_id: &str) -> &str {
        self.voice_map
            .get(voice_model_id)
            .map(String::as_str)
            .unwrap_or(DEFAULT_ESPEAK_VOICE)
    }

    fn build_args(&self, voice_model_id: &str, output_path: &std::path::Path) -> Vec<OsString> {
        // Text goes over stdin so it can never be mistaken for a flag
        vec![
            "-v".into(),
            self.voice_for(voice_model_id).into(),
            "-s".into(),
            self.words_per_minute.to_string().into(),
            "-w".into(),
            output_path.into(),
            "--stdin".into(),
        ]
    }
}

#[async_trait]
impl TtsRepository for EspeakTtsRepository {
    fn name(&self) -> &'static str {
        "espeak"
    }

    async fn synthesize(
        &self,
        chunk: &TextChunk,
        voice_model_id: &str,
        workspace: &JobWorkspace,
        _options: &SynthesisOptions,
    ) -> Result<PathBuf, TtsError> {
        let output_path = workspace.chunk_path(chunk.index, "wav");
        let args = self.build_args(voice_model_id, &output_path);

        tracing::debug!(
            chunk_index = chunk.index,
            voice = self.voice_for(voice_model_id),
            "Generating chunk with espeak"
        );

        let output = run_process(self.espeak_path.as_os_str(), &args, Some(&chunk.text), "espeak")
            .await
            .map_err(|e| {
                TtsError::BackendUnavailable(format!(
                    "failed to start {}: {}",
                    self.espeak_path.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(SynthesisFailure::ProcessFailed {
                status: output.status.to_string(),
                diagnostics: output.diagnostics(),
            }
            .into());
        }

        if !tokio::fs::try_exists(&output_path).await.unwrap_or(false) {
            return Err(SynthesisFailure::MissingOutput(output_path).into());
        }

        Ok(output_path)
    }

    async fn health_check(&self) -> Result<(), TtsError> {
        let output = run_process(self.espeak_path.as_os_str(), ["--version"], None, "espeak")
            .await
            .map_err(|e| TtsError::BackendUnavailable(e.to_string()))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(TtsError::BackendUnavailable(format!(
                "espeak --version exited with {}",
                output.status
            )))
        }
    }
}
