use super::tts_error::{SynthesisFailure, TtsError};
use super::tts_repository::TtsRepository;
use crate::domain::chunking::TextChunk;
use crate::domain::generation::{JobWorkspace, SynthesisOptions};
use crate::infrastructure::process::{run_process, ProcessOutput};
use async_trait::async_trait;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

const DEFAULT_CLONE_LANGUAGE: &str = "en";

/// How the script expects `(text, model, output)` on its command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgStyle {
    /// `script --text <t> --model <m> --output <o>`
    Flagged,
    /// `script <t> <m> <o>`
    Positional,
}

/// The single JSON object a script prints on stdout when it finishes
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ScriptResult {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

/// Local model (or voice cloning) TTS run as a Python script per chunk
pub struct ScriptTtsRepository {
    name: &'static str,
    python_path: PathBuf,
    script_path: PathBuf,
    arg_style: ArgStyle,
    voice_clone: bool,
}

impl ScriptTtsRepository {
    /// Script that narrates with a locally installed model (Coqui, KaniTTS)
    pub fn local_model(python_path: PathBuf, script_path: PathBuf, arg_style: ArgStyle) -> Self {
        Self {
            name: "local-model-script",
            python_path,
            script_path,
            arg_style,
            voice_clone: false,
        }
    }

    /// Script that clones the voice of a reference recording (XTTS).
    /// Always invoked with flags since it takes optional extras.
    pub fn voice_clone(python_path: PathBuf, script_path: PathBuf) -> Self {
        Self {
            name: "voice-clone-script",
            python_path,
            script_path,
            arg_style: ArgStyle::Flagged,
            voice_clone: true,
        }
    }

    fn build_args(
        &self,
        text: &str,
        model_id: &str,
        output_path: &Path,
        options: &SynthesisOptions,
    ) -> Result<Vec<OsString>, TtsError> {
        let mut args: Vec<OsString> = vec![self.script_path.clone().into()];

        match self.arg_style {
            ArgStyle::Positional => {
                args.push(text.into());
                args.push(model_id.into());
                args.push(output_path.into());
            }
            ArgStyle::Flagged => {
                args.extend(["--text".into(), text.into()]);
                args.extend(["--model".into(), model_id.into()]);
                args.extend(["--output".into(), output_path.into()]);
            }
        }

        if self.voice_clone {
            let reference = options.reference_audio.as_ref().ok_or_else(|| {
                SynthesisFailure::Reported("voice cloning requires reference audio".to_string())
            })?;
            let language = options.language.as_deref().unwrap_or(DEFAULT_CLONE_LANGUAGE);
            args.extend(["--reference".into(), reference.into()]);
            args.extend(["--language".into(), language.into()]);
        }

        Ok(args)
    }

    /// Interpret a finished script run
    fn evaluate(output: &ProcessOutput) -> Result<ScriptResult, SynthesisFailure> {
        if !output.status.success() {
            // Scripts usually still print their result object before exiting
            let diagnostics = match parse_script_output(&output.stdout) {
                Ok(result) if !result.message.is_empty() => result.message,
                _ => output.diagnostics(),
            };
            return Err(SynthesisFailure::ProcessFailed {
                status: output.status.to_string(),
                diagnostics,
            });
        }

        let result = parse_script_output(&output.stdout)?;
        if !result.success {
            return Err(SynthesisFailure::Reported(result.message));
        }

        Ok(result)
    }
}

/// Parse stdout as exactly one JSON result object
pub fn parse_script_output(stdout: &str) -> Result<ScriptResult, SynthesisFailure> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Err(SynthesisFailure::ParseFailure("no output on stdout".to_string()));
    }

    serde_json::from_str(trimmed).map_err(|e| SynthesisFailure::ParseFailure(e.to_string()))
}

#[async_trait]
impl TtsRepository for ScriptTtsRepository {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn synthesize(
        &self,
        chunk: &TextChunk,
        voice_model_id: &str,
        workspace: &JobWorkspace,
        options: &SynthesisOptions,
    ) -> Result<PathBuf, TtsError> {
        let start_time = std::time::Instant::now();
        let output_path = workspace.chunk_path(chunk.index, "wav");
        let args = self.build_args(&chunk.text, voice_model_id, &output_path, options)?;

        tracing::info!(
            backend = self.name,
            chunk_index = chunk.index,
            model = voice_model_id,
            script = %self.script_path.display(),
            text_length = chunk.len(),
            "Running TTS script"
        );

        let output = run_process(self.python_path.as_os_str(), &args, None, self.name)
            .await
            .map_err(|e| {
                TtsError::BackendUnavailable(format!(
                    "failed to start {}: {}",
                    self.python_path.display(),
                    e
                ))
            })?;

        let result = Self::evaluate(&output).map_err(|failure| {
            tracing::error!(
                backend = self.name,
                chunk_index = chunk.index,
                error = %failure,
                "TTS script failed"
            );
            failure
        })?;

        if !tokio::fs::try_exists(&output_path).await.unwrap_or(false) {
            return Err(SynthesisFailure::MissingOutput(output_path).into());
        }

        tracing::info!(
            backend = self.name,
            chunk_index = chunk.index,
            latency_ms = start_time.elapsed().as_millis(),
            message = %result.message,
            "TTS script completed"
        );

        Ok(output_path)
    }

    async fn health_check(&self) -> Result<(), TtsError> {
        if !tokio::fs::try_exists(&self.script_path).await.unwrap_or(false) {
            return Err(TtsError::BackendUnavailable(format!(
                "script not found at {}",
                self.script_path.display()
            )));
        }

        let output = run_process(self.python_path.as_os_str(), ["--version"], None, self.name)
            .await
            .map_err(|e| TtsError::BackendUnavailable(e.to_string()))?;
        if !output.status.success() {
            return Err(TtsError::BackendUnavailable(format!(
                "{} --version exited with {}",
                self.python_path.display(),
                output.status
            )));
        }

        Ok(())
    }
}
