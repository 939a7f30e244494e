use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;

use crate::{
    domain::{
        generation::{GenerationRequest, GenerationService, GenerationServiceApi, SynthesisOptions},
        voice::VoiceModel,
    },
    error::{AppError, AppResult},
    infrastructure::http::RequestId,
};

/// Response for POST /api/generate-audio
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateAudioResponse {
    pub success: bool,
    pub audio_url: String,
    pub message: String,
}

/// Response for GET /api/voices
#[derive(Debug, Serialize, Deserialize)]
pub struct VoicesResponse {
    pub success: bool,
    pub voices: Vec<VoiceModel>,
}

/// Request for POST /api/estimate
#[derive(Debug, Serialize, Deserialize)]
pub struct EstimateRequest {
    pub text: String,
}

/// Response for POST /api/estimate
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateResponse {
    pub success: bool,
    pub chunks: usize,
    pub estimated_minutes: u64,
}

/// Fields collected from the generate-audio multipart form
#[derive(Default)]
struct GenerateForm {
    text: Option<String>,
    text_file: Option<String>,
    voice_model_id: Option<String>,
    language: Option<String>,
    reference_audio: Option<NamedTempFile>,
}

pub struct AudioController {
    generation_service: Arc<GenerationService>,
    upload_dir: PathBuf,
}

impl AudioController {
    pub fn new(generation_service: Arc<GenerationService>, upload_dir: PathBuf) -> Self {
        Self {
            generation_service,
            upload_dir,
        }
    }

    /// POST /api/generate-audio - Narrate text (or an uploaded text file)
    pub async fn generate_audio(
        State(controller): State<Arc<AudioController>>,
        Extension(request_id): Extension<RequestId>,
        multipart: Multipart,
    ) -> AppResult<(StatusCode, Json<GenerateAudioResponse>)> {
        let form = controller.read_form(multipart).await?;

        // An uploaded file wins over the text field
        let text = form
            .text_file
            .or(form.text)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| AppError::BadRequest("Please provide text or upload a file".to_string()))?;

        let voice_model_id = form
            .voice_model_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| AppError::BadRequest("Voice model ID is required".to_string()))?;

        tracing::info!(
            request_id = %request_id.0,
            voice_model_id = %voice_model_id,
            text_length = text.chars().count(),
            has_reference_audio = form.reference_audio.is_some(),
            "Audio generation request"
        );

        let options = SynthesisOptions {
            reference_audio: form.reference_audio.as_ref().map(|file| file.path().to_path_buf()),
            language: form.language.filter(|language| !language.trim().is_empty()),
        };

        let outcome = controller
            .generation_service
            .generate(GenerationRequest::new(text, voice_model_id).with_options(options))
            .await?;

        // The reference upload is only needed for the duration of the job
        drop(form.reference_audio);

        let file_name = outcome
            .final_artifact_path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| AppError::Internal("stitched file has no usable name".to_string()))?;

        Ok((
            StatusCode::OK,
            Json(GenerateAudioResponse {
                success: true,
                audio_url: format!("/audio/{}", file_name),
                message: outcome.summary_message,
            }),
        ))
    }

    /// GET /api/voices - List the voice catalog
    pub async fn list_voices(
        State(controller): State<Arc<AudioController>>,
    ) -> Json<VoicesResponse> {
        Json(VoicesResponse {
            success: true,
            voices: controller.generation_service.catalog().list().to_vec(),
        })
    }

    /// POST /api/estimate - Chunk count and expected processing time
    pub async fn estimate(
        State(controller): State<Arc<AudioController>>,
        Json(request): Json<EstimateRequest>,
    ) -> Json<EstimateResponse> {
        let estimate = controller.generation_service.estimate(&request.text);

        Json(EstimateResponse {
            success: true,
            chunks: estimate.chunk_count,
            estimated_minutes: estimate.estimated_duration_minutes,
        })
    }

    async fn read_form(&self, mut multipart: Multipart) -> AppResult<GenerateForm> {
        let mut form = GenerateForm::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "text" => form.text = Some(field.text().await.map_err(multipart_error)?),
                "voiceModelId" => {
                    form.voice_model_id = Some(field.text().await.map_err(multipart_error)?)
                }
                "language" => form.language = Some(field.text().await.map_err(multipart_error)?),
                "textFile" => {
                    let bytes = field.bytes().await.map_err(multipart_error)?;
                    let text = String::from_utf8(bytes.to_vec()).map_err(|_| {
                        AppError::BadRequest("Uploaded text file must be UTF-8".to_string())
                    })?;
                    form.text_file = Some(text);
                }
                "referenceAudio" => {
                    let extension = upload_extension(field.file_name());
                    let bytes = field.bytes().await.map_err(multipart_error)?;
                    if !bytes.is_empty() {
                        form.reference_audio = Some(self.store_upload(&bytes, &extension).await?);
                    }
                }
                other => {
                    tracing::debug!(field = other, "Ignoring unknown form field");
                }
            }
        }

        Ok(form)
    }

    /// Persist an upload under the upload dir. Deleted when the handle drops.
    async fn store_upload(&self, bytes: &[u8], extension: &str) -> AppResult<NamedTempFile> {
        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|e| AppError::Internal(format!("failed to create upload dir: {}", e)))?;

        let file = tempfile::Builder::new()
            .prefix("reference_")
            .suffix(&format!(".{}", extension))
            .tempfile_in(&self.upload_dir)
            .map_err(|e| AppError::Internal(format!("failed to store upload: {}", e)))?;

        tokio::fs::write(file.path(), bytes)
            .await
            .map_err(|e| AppError::Internal(format!("failed to store upload: {}", e)))?;

        Ok(file)
    }
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(err.body_text())
    }
}

/// Extension of an uploaded file name, restricted to short alphanumerics
fn upload_extension(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| "wav".to_string())
}
