use super::tts_error::{SynthesisFailure, TtsError};
use super::tts_repository::TtsRepository;
use crate::domain::chunking::TextChunk;
use crate::domain::generation::{JobWorkspace, SynthesisOptions};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_HUGGINGFACE_API_URL: &str = "https://api-inference.huggingface.co/models";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Longest error body kept in messages
const MAX_ERROR_BODY: usize = 300;

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
}

/// Hugging Face inference API implementation of TTS repository
pub struct HuggingFaceTtsRepository {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl HuggingFaceTtsRepository {
    pub fn new(api_url: String, api_key: String) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn model_url(&self, voice_model_id: &str) -> String {
        format!("{}/{}", self.api_url, voice_model_id)
    }

    /// Call the inference API for a single chunk and return the audio bytes
    async fn call_inference(&self, text: &str, voice_model_id: &str) -> Result<Vec<u8>, TtsError> {
        let text_preview = truncate(text, 80);
        tracing::info!(
            model = voice_model_id,
            text_length = text.len(),
            text_preview = %text_preview,
            "Calling Hugging Face inference API"
        );

        let response = self
            .client
            .post(self.model_url(voice_model_id))
            .bearer_auth(&self.api_key)
            .json(&InferenceRequest { inputs: text })
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, model = voice_model_id, "Hugging Face request failed");
                TtsError::BackendUnavailable(format!("Hugging Face request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = status.as_u16(),
                model = voice_model_id,
                body = %truncate(&body, MAX_ERROR_BODY),
                "Hugging Face inference API returned an error"
            );
            return Err(classify_error(status, voice_model_id, &body));
        }

        let audio = response.bytes().await.map_err(|e| {
            SynthesisFailure::Request(format!("failed to read audio response: {}", e))
        })?;

        if audio.is_empty() {
            return Err(SynthesisFailure::Request("empty audio response".to_string()).into());
        }

        Ok(audio.to_vec())
    }
}

/// Map an unsuccessful HTTP status to the backend error taxonomy
fn classify_error(status: StatusCode, voice_model_id: &str, body: &str) -> TtsError {
    let detail = truncate(body, MAX_ERROR_BODY);
    match status {
        StatusCode::TOO_MANY_REQUESTS => TtsError::RateLimited(detail),
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY | StatusCode::GATEWAY_TIMEOUT => {
            TtsError::BackendUnavailable(format!("model {} is unavailable: {}", voice_model_id, detail))
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            TtsError::BackendUnavailable(format!("Hugging Face rejected the API key: {}", detail))
        }
        StatusCode::NOT_FOUND => TtsError::InvalidVoiceModel(voice_model_id.to_string()),
        _ => SynthesisFailure::Request(format!("HTTP {}: {}", status.as_u16(), detail)).into(),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[async_trait]
impl TtsRepository for HuggingFaceTtsRepository {
    fn name(&self) -> &'static str {
        "huggingface"
    }

    async fn synthesize(
        &self,
        chunk: &TextChunk,
        voice_model_id: &str,
        workspace: &JobWorkspace,
        _options: &SynthesisOptions,
    ) -> Result<PathBuf, TtsError> {
        let start_time = std::time::Instant::now();

        let audio = self.call_inference(&chunk.text, voice_model_id).await?;
        let output_path = workspace.chunk_path(chunk.index, "wav");
        tokio::fs::write(&output_path, &audio).await?;

        tracing::info!(
            provider = "huggingface",
            chunk_index = chunk.index,
            latency_ms = start_time.elapsed().as_millis(),
            audio_size_bytes = audio.len(),
            "Chunk synthesized"
        );

        Ok(output_path)
    }

    fn is_remote(&self) -> bool {
        true
    }

    async fn health_check(&self) -> Result<(), TtsError> {
        if self.api_key.trim().is_empty() {
            return Err(TtsError::BackendUnavailable(
                "HUGGINGFACE_API_KEY is not set".to_string(),
            ));
        }
        Ok(())
    }
}
