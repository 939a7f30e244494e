use super::tts_error::TtsError;
use crate::domain::chunking::TextChunk;
use crate::domain::generation::{JobWorkspace, SynthesisOptions};
use crate::domain::voice::VoiceProvider;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Repository for TTS synthesis operations.
/// Abstracts the underlying TTS provider (remote inference API, local model
/// script, voice cloning script, system synthesizer).
///
/// Implementations are responsible for:
/// - Writing exactly one audio file per chunk inside the job workspace
/// - Classifying failures into a `TtsError` kind
/// - Provider-specific voice selection and invocation details
#[async_trait]
pub trait TtsRepository: Send + Sync {
    /// Short provider name used in logs
    fn name(&self) -> &'static str;

    /// Synthesize one chunk to an audio file and return its path
    ///
    /// # Arguments
    /// * `chunk` - The chunk to narrate
    /// * `voice_model_id` - Backend-specific voice identifier from the catalog
    /// * `workspace` - Job-scoped directory the artifact must be written into
    /// * `options` - Per-request extras (reference audio, language)
    async fn synthesize(
        &self,
        chunk: &TextChunk,
        voice_model_id: &str,
        workspace: &JobWorkspace,
        options: &SynthesisOptions,
    ) -> Result<PathBuf, TtsError>;

    /// Whether calls go to a network API that throttles sequential requests
    fn is_remote(&self) -> bool {
        false
    }

    async fn health_check(&self) -> Result<(), TtsError> {
        Ok(())
    }

    /// Release backend-owned resources. Called once at service teardown.
    async fn dispose(&self) -> Result<(), TtsError> {
        Ok(())
    }
}

/// Backends keyed by the provider a voice model declares
#[derive(Clone, Default)]
pub struct TtsBackendRegistry {
    backends: HashMap<VoiceProvider, Arc<dyn TtsRepository>>,
}

impl TtsBackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider: VoiceProvider, backend: Arc<dyn TtsRepository>) {
        tracing::info!(provider = %provider, backend = backend.name(), "TTS backend registered");
        self.backends.insert(provider, backend);
    }

    pub fn get(&self, provider: VoiceProvider) -> Option<Arc<dyn TtsRepository>> {
        self.backends.get(&provider).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VoiceProvider, &Arc<dyn TtsRepository>)> {
        self.backends.iter().map(|(provider, backend)| (*provider, backend))
    }

    /// Dispose every registered backend, logging failures
    pub async fn dispose_all(&self) {
        for (provider, backend) in self.iter() {
            if let Err(e) = backend.dispose().await {
                tracing::warn!(provider = %provider, error = %e, "Failed to dispose TTS backend");
            }
        }
    }
}
