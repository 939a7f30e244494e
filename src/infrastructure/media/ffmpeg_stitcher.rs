use super::audio_stitcher::{AudioStitcher, StitchError};
use crate::infrastructure::process::{run_process, ProcessOutput};
use async_trait::async_trait;
use chrono::Utc;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const OUTPUT_PREFIX: &str = "narration";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StitchStrategy {
    /// Concat demuxer fed by a manifest file
    Manifest,
    /// Every input passed with `-i` and joined by the concat filter.
    /// Also tried when a manifest run exits non-zero.
    Merge,
}

/// Fixed target format every stitched file is re-encoded to
#[derive(Debug, Clone, PartialEq, Eq)]
struct OutputEncoding {
    codec: String,
    bitrate: String,
    sample_rate: u32,
}

impl Default for OutputEncoding {
    fn default() -> Self {
        Self {
            codec: "libmp3lame".to_string(),
            bitrate: "128k".to_string(),
            sample_rate: 44100,
        }
    }
}

impl OutputEncoding {
    fn args(&self) -> Vec<OsString> {
        vec![
            "-codec:a".into(),
            self.codec.clone().into(),
            "-b:a".into(),
            self.bitrate.clone().into(),
            "-ar".into(),
            self.sample_rate.to_string().into(),
        ]
    }
}

/// Stitches chunk audio with an external ffmpeg binary
pub struct FfmpegStitcher {
    ffmpeg_path: PathBuf,
    output_dir: PathBuf,
    strategy: StitchStrategy,
    encoding: OutputEncoding,
}

impl FfmpegStitcher {
    pub fn new(ffmpeg_path: PathBuf, output_dir: PathBuf, strategy: StitchStrategy) -> Self {
        Self {
            ffmpeg_path,
            output_dir,
            strategy,
            encoding: OutputEncoding::default(),
        }
    }

    fn manifest_args(&self, manifest: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-hide_banner".into(),
            "-y".into(),
            "-f".into(),
            "concat".into(),
            "-safe".into(),
            "0".into(),
            "-i".into(),
            manifest.into(),
        ];
        args.extend(self.encoding.args());
        args.push(output.into());
        args
    }

    fn merge_args(&self, artifacts: &[PathBuf], output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-hide_banner".into(), "-y".into()];
        for artifact in artifacts {
            args.push("-i".into());
            args.push(artifact.into());
        }
        args.push("-filter_complex".into());
        args.push(concat_filter(artifacts.len()).into());
        args.push("-map".into());
        args.push("[out]".into());
        args.extend(self.encoding.args());
        args.push(output.into());
        args
    }

    async fn stitch_with_manifest(
        &self,
        artifacts: &[PathBuf],
        suffix: &str,
        output: &Path,
    ) -> Result<ProcessOutput, StitchError> {
        // The concat demuxer resolves relative entries against the manifest's
        // own directory, so every entry is made absolute first
        let mut absolute = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            absolute.push(tokio::fs::canonicalize(artifact).await?);
        }

        let manifest_path = self.output_dir.join(format!("concat_{}.txt", suffix));
        tokio::fs::write(&manifest_path, build_manifest(&absolute)).await?;

        let result = self
            .run_ffmpeg(self.manifest_args(&manifest_path, output))
            .await;

        if let Err(e) = tokio::fs::remove_file(&manifest_path).await {
            tracing::warn!(
                manifest = %manifest_path.display(),
                error = %e,
                "Failed to delete concat manifest"
            );
        }

        result
    }

    /// One tool run. Succeeds only on a zero exit that left `output` behind.
    async fn run_strategy(
        &self,
        strategy: StitchStrategy,
        artifacts: &[PathBuf],
        suffix: &str,
        output: &Path,
    ) -> Result<(), StitchError> {
        let run = match strategy {
            StitchStrategy::Manifest => self.stitch_with_manifest(artifacts, suffix, output).await?,
            StitchStrategy::Merge => self.run_ffmpeg(self.merge_args(artifacts, output)).await?,
        };

        if !run.status.success() {
            return Err(StitchError::ToolFailed(format!(
                "ffmpeg exited with {}: {}",
                run.status,
                run.diagnostics()
            )));
        }
        if !tokio::fs::try_exists(output).await.unwrap_or(false) {
            return Err(StitchError::MissingOutput(output.to_path_buf()));
        }
        Ok(())
    }

    async fn run_ffmpeg(&self, args: Vec<OsString>) -> Result<ProcessOutput, StitchError> {
        run_process(self.ffmpeg_path.as_os_str(), &args, None, "ffmpeg")
            .await
            .map_err(|e| {
                StitchError::ToolUnavailable(format!(
                    "failed to start {}: {}",
                    self.ffmpeg_path.display(),
                    e
                ))
            })
    }
}

/// One `file '<path>'` line per input. Single quotes are closed, escaped and
/// reopened as the concat demuxer expects.
pub fn build_manifest(artifacts: &[PathBuf]) -> String {
    artifacts
        .iter()
        .map(|path| {
            let escaped = path.to_string_lossy().replace('\'', r"'\''");
            format!("file '{}'\n", escaped)
        })
        .collect()
}

/// `[0:a][1:a]...concat=n=N:v=0:a=1[out]`
pub fn concat_filter(inputs: usize) -> String {
    let streams: String = (0..inputs).map(|i| format!("[{}:a]", i)).collect();
    format!("{}concat=n={}:v=0:a=1[out]", streams, inputs)
}

/// Millisecond timestamp plus random hex, unique across concurrent jobs
fn output_suffix() -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("{}_{}", Utc::now().timestamp_millis(), &random[..8])
}

#[async_trait]
impl AudioStitcher for FfmpegStitcher {
    async fn stitch(&self, artifacts: &[PathBuf]) -> Result<PathBuf, StitchError> {
        if artifacts.is_empty() {
            return Err(StitchError::NoInput);
        }

        let start_time = std::time::Instant::now();
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let suffix = output_suffix();
        let output_path = self
            .output_dir
            .join(format!("{}_{}.mp3", OUTPUT_PREFIX, suffix));

        tracing::info!(
            inputs = artifacts.len(),
            strategy = ?self.strategy,
            output = %output_path.display(),
            "Stitching audio files"
        );

        let mut result = self
            .run_strategy(self.strategy, artifacts, &suffix, &output_path)
            .await;

        if self.strategy == StitchStrategy::Manifest {
            if let Err(StitchError::ToolFailed(reason)) = &result {
                tracing::warn!(error = %reason, "Manifest concatenation failed, retrying with merge");
                result = self
                    .run_strategy(StitchStrategy::Merge, artifacts, &suffix, &output_path)
                    .await;
            }
        }

        let failure = match result {
            Ok(()) => {
                tracing::info!(
                    output = %output_path.display(),
                    latency_ms = start_time.elapsed().as_millis(),
                    "Audio stitching completed"
                );
                return Ok(output_path);
            }
            Err(e) => e,
        };

        tracing::error!(error = %failure, "Audio stitching failed");

        // Never leave a half-written final file behind
        if let Err(e) = tokio::fs::remove_file(&output_path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(output = %output_path.display(), error = %e, "Failed to delete partial output");
            }
        }

        Err(failure)
    }

    async fn health_check(&self) -> Result<(), StitchError> {
        let output = self.run_ffmpeg(vec!["-version".into()]).await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(StitchError::ToolUnavailable(format!(
                "ffmpeg -version exited with {}",
                output.status
            )))
        }
    }
}
