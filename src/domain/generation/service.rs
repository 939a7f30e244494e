use super::dto::{GenerationEstimate, GenerationOutcome, GenerationRequest, SynthesisOptions};
use super::error::GenerationError;
use super::workspace::JobWorkspace;
use crate::domain::chunking::{TextChunk, TextChunker};
use crate::domain::voice::{VoiceCatalog, VoiceModel};
use crate::infrastructure::media::AudioStitcher;
use crate::infrastructure::repositories::{TtsBackendRegistry, TtsRepository};
use crate::infrastructure::storage::ArtifactJanitor;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Seconds of wall clock budgeted per chunk in estimates
const ESTIMATE_SECONDS_PER_CHUNK: u64 = 2;
/// Fixed stitching overhead in estimates
const ESTIMATE_OVERHEAD_SECONDS: u64 = 10;

pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct GenerationSettings {
    /// Root under which per-job workspaces are created
    pub temp_dir: PathBuf,
    /// Pause between consecutive calls to a remote backend
    pub request_delay: Duration,
}

impl GenerationSettings {
    pub fn new(temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: temp_dir.into(),
            request_delay: DEFAULT_REQUEST_DELAY,
        }
    }

    pub fn with_request_delay(mut self, request_delay: Duration) -> Self {
        self.request_delay = request_delay;
        self
    }
}

pub struct GenerationService {
    chunker: TextChunker,
    catalog: Arc<VoiceCatalog>,
    backends: Arc<TtsBackendRegistry>,
    stitcher: Arc<dyn AudioStitcher>,
    janitor: ArtifactJanitor,
    settings: GenerationSettings,
}

impl GenerationService {
    pub fn new(
        chunker: TextChunker,
        catalog: Arc<VoiceCatalog>,
        backends: Arc<TtsBackendRegistry>,
        stitcher: Arc<dyn AudioStitcher>,
        janitor: ArtifactJanitor,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            chunker,
            catalog,
            backends,
            stitcher,
            janitor,
            settings,
        }
    }

    pub fn catalog(&self) -> &VoiceCatalog {
        &self.catalog
    }

    pub fn backends(&self) -> &TtsBackendRegistry {
        &self.backends
    }

    pub fn stitcher(&self) -> &Arc<dyn AudioStitcher> {
        &self.stitcher
    }

    /// Resolve the voice and its backend, rejecting requests that cannot run
    fn validate(
        &self,
        request: &GenerationRequest,
    ) -> Result<(VoiceModel, Arc<dyn TtsRepository>), GenerationError> {
        if request.text.trim().is_empty() {
            return Err(GenerationError::InvalidInput(
                "Text cannot be empty".to_string(),
            ));
        }

        let voice_model_id = request.voice_model_id.trim();
        if voice_model_id.is_empty() {
            return Err(GenerationError::InvalidInput(
                "Voice model ID is required".to_string(),
            ));
        }

        let voice = self.catalog.find(voice_model_id).cloned().ok_or_else(|| {
            GenerationError::InvalidInput(format!("Unknown voice model: {}", voice_model_id))
        })?;

        if voice.requires_reference_audio && request.options.reference_audio.is_none() {
            return Err(GenerationError::InvalidInput(format!(
                "Voice model {} requires reference audio",
                voice.id
            )));
        }

        let backend = self.backends.get(voice.provider).ok_or_else(|| {
            GenerationError::BackendUnavailable(format!(
                "no backend configured for {} voices",
                voice.provider
            ))
        })?;

        Ok((voice, backend))
    }

    /// Synthesize every chunk in index order. Any failure aborts the job.
    async fn synthesize_all(
        &self,
        chunks: &[TextChunk],
        voice: &VoiceModel,
        backend: &dyn TtsRepository,
        workspace: &JobWorkspace,
        options: &SynthesisOptions,
        progress: &(dyn Fn(usize, usize) + Send + Sync),
    ) -> Result<Vec<(usize, PathBuf)>, GenerationError> {
        let total = chunks.len();
        let mut artifacts = Vec::with_capacity(total);

        for (position, chunk) in chunks.iter().enumerate() {
            tracing::info!(
                job_id = %workspace.id(),
                chunk_index = chunk.index,
                total_chunks = total,
                chunk_length = chunk.len(),
                backend = backend.name(),
                "Generating audio for chunk"
            );

            let path = backend
                .synthesize(chunk, &voice.id, workspace, options)
                .await
                .map_err(|e| {
                    tracing::error!(
                        job_id = %workspace.id(),
                        chunk_index = chunk.index,
                        error = %e,
                        "Chunk synthesis failed"
                    );
                    GenerationError::from_backend(chunk.index, e)
                })?;

            artifacts.push((chunk.index, path));
            progress(position + 1, total);

            let is_last = position + 1 == total;
            if backend.is_remote() && !is_last && !self.settings.request_delay.is_zero() {
                tokio::time::sleep(self.settings.request_delay).await;
            }
        }

        Ok(artifacts)
    }

    /// Options as the backend sees them, with the reference recording moved
    /// into the job workspace
    async fn job_options(
        &self,
        options: &SynthesisOptions,
        workspace: &JobWorkspace,
    ) -> Result<SynthesisOptions, GenerationError> {
        let mut job_options = options.clone();
        if let Some(reference) = &options.reference_audio {
            job_options.reference_audio = Some(workspace.adopt_reference(reference).await?);
        }
        Ok(job_options)
    }
}

/// `ceil((chunks * 2 + 10) / 60)` minutes
pub fn estimate_minutes(chunk_count: usize) -> u64 {
    let seconds = chunk_count as u64 * ESTIMATE_SECONDS_PER_CHUNK + ESTIMATE_OVERHEAD_SECONDS;
    seconds.div_ceil(60)
}

#[async_trait]
pub trait GenerationServiceApi: Send + Sync {
    /// Narrate `request.text` into a single stitched audio file
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutcome, GenerationError>;

    /// Same as `generate`, reporting `(completed, total)` after each chunk
    async fn generate_with_progress(
        &self,
        request: GenerationRequest,
        progress: &(dyn Fn(usize, usize) + Send + Sync),
    ) -> Result<GenerationOutcome, GenerationError>;

    /// Chunk count and rough duration, without synthesizing anything
    fn estimate(&self, text: &str) -> GenerationEstimate;
}

#[async_trait]
impl GenerationServiceApi for GenerationService {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutcome, GenerationError> {
        self.generate_with_progress(request, &|_: usize, _: usize| {})
            .await
    }

    async fn generate_with_progress(
        &self,
        request: GenerationRequest,
        progress: &(dyn Fn(usize, usize) + Send + Sync),
    ) -> Result<GenerationOutcome, GenerationError> {
        let start_time = std::time::Instant::now();
        let (voice, backend) = self.validate(&request)?;

        let chunks = self.chunker.chunk(&request.text);
        if chunks.is_empty() {
            return Err(GenerationError::EmptyInput);
        }

        if let Some(stats) = self.chunker.stats(&request.text) {
            tracing::info!(
                voice_model_id = %voice.id,
                provider = %voice.provider,
                total_chunks = stats.total_chunks,
                average_chunk_length = stats.average_chunk_length,
                max_chunk_length = stats.max_chunk_length,
                max_chunk_size = self.chunker.max_chunk_size(),
                "Text chunked"
            );
        }

        let workspace = JobWorkspace::create(&self.settings.temp_dir).await?;
        let _held = self.janitor.hold(workspace.dir());

        let synthesized = match self.job_options(&request.options, &workspace).await {
            Ok(options) => {
                self.synthesize_all(&chunks, &voice, backend.as_ref(), &workspace, &options, progress)
                    .await
            }
            Err(e) => Err(e),
        };

        let mut artifacts = match synthesized {
            Ok(artifacts) => artifacts,
            Err(e) => {
                if let Err(cleanup) = workspace.remove().await {
                    tracing::warn!(
                        job_id = %workspace.id(),
                        error = %cleanup,
                        "Failed to remove job workspace"
                    );
                }
                return Err(e);
            }
        };

        artifacts.sort_by_key(|(index, _)| *index);
        let ordered: Vec<PathBuf> = artifacts.into_iter().map(|(_, path)| path).collect();

        let final_artifact_path = match self.stitcher.stitch(&ordered).await {
            Ok(path) => path,
            Err(e) => {
                tracing::error!(
                    job_id = %workspace.id(),
                    workspace = %workspace.dir().display(),
                    error = %e,
                    "Stitching failed, keeping chunk audio"
                );
                return Err(GenerationError::StitchFailed(e));
            }
        };

        if let Err(e) = workspace.remove().await {
            tracing::warn!(job_id = %workspace.id(), error = %e, "Failed to remove job workspace");
        }
        self.janitor.sweep().await;

        let character_count = request.text.chars().count();
        let chunk_count = chunks.len();

        tracing::info!(
            job_id = %workspace.id(),
            output = %final_artifact_path.display(),
            chunk_count,
            character_count,
            latency_ms = start_time.elapsed().as_millis(),
            "Audio generation completed"
        );

        Ok(GenerationOutcome {
            final_artifact_path,
            summary_message: format!(
                "Successfully generated audio from {} characters in {} chunks",
                character_count, chunk_count
            ),
            chunk_count,
            character_count,
        })
    }

    fn estimate(&self, text: &str) -> GenerationEstimate {
        let chunk_count = self.chunker.chunk(text).len();
        GenerationEstimate {
            chunk_count,
            estimated_duration_minutes: estimate_minutes(chunk_count),
        }
    }
}
