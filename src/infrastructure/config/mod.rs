use crate::domain::chunking::DEFAULT_MAX_CHUNK_SIZE;
use crate::infrastructure::media::StitchStrategy;
use crate::infrastructure::repositories::{ArgStyle, DEFAULT_HUGGINGFACE_API_URL};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub log_format: LogFormat,
    // Chunking and uploads
    pub max_chunk_size: usize,
    pub max_upload_bytes: usize,
    // Storage
    pub temp_dir: PathBuf,
    pub output_dir: PathBuf,
    pub output_max_age: Duration,
    pub temp_max_age: Duration,
    // Pipeline
    pub request_delay: Duration,
    pub ffmpeg_path: PathBuf,
    pub stitch_strategy: StitchStrategy,
    // Remote inference
    pub huggingface_api_key: Option<String>,
    pub huggingface_api_url: String,
    // Local backends
    pub python_path: PathBuf,
    pub local_tts_script: PathBuf,
    pub local_tts_arg_style: ArgStyle,
    pub voice_clone_script: Option<PathBuf>,
    pub espeak_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let config = Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            environment: match env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string())
                .as_str()
            {
                "production" => Environment::Production,
                _ => Environment::Development,
            },
            log_format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
            max_chunk_size: env::var("MAX_CHUNK_SIZE")
                .unwrap_or_else(|_| DEFAULT_MAX_CHUNK_SIZE.to_string())
                .parse()?,
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .unwrap_or_else(|_| (10 * 1024 * 1024).to_string())
                .parse()?,
            temp_dir: env::var("TEMP_DIR")
                .unwrap_or_else(|_| "temp".to_string())
                .into(),
            output_dir: env::var("OUTPUT_DIR")
                .unwrap_or_else(|_| "output".to_string())
                .into(),
            output_max_age: minutes(
                env::var("OUTPUT_MAX_AGE_MINUTES")
                    .unwrap_or_else(|_| "120".to_string())
                    .parse()?,
            ),
            temp_max_age: minutes(
                env::var("TEMP_MAX_AGE_MINUTES")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()?,
            ),
            request_delay: Duration::from_millis(
                env::var("REQUEST_DELAY_MS")
                    .unwrap_or_else(|_| "1000".to_string())
                    .parse()?,
            ),
            ffmpeg_path: env::var("FFMPEG_PATH")
                .unwrap_or_else(|_| "ffmpeg".to_string())
                .into(),
            stitch_strategy: match env::var("STITCH_STRATEGY")
                .unwrap_or_else(|_| "manifest".to_string())
                .to_lowercase()
                .as_str()
            {
                "merge" => StitchStrategy::Merge,
                _ => StitchStrategy::Manifest,
            },
            huggingface_api_key: env::var("HUGGINGFACE_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            huggingface_api_url: env::var("HUGGINGFACE_API_URL")
                .unwrap_or_else(|_| DEFAULT_HUGGINGFACE_API_URL.to_string()),
            python_path: env::var("PYTHON_PATH")
                .unwrap_or_else(|_| "python3".to_string())
                .into(),
            local_tts_script: env::var("LOCAL_TTS_SCRIPT")
                .unwrap_or_else(|_| "python_tts_server.py".to_string())
                .into(),
            local_tts_arg_style: match env::var("LOCAL_TTS_ARG_STYLE")
                .unwrap_or_else(|_| "flagged".to_string())
                .to_lowercase()
                .as_str()
            {
                "positional" => ArgStyle::Positional,
                _ => ArgStyle::Flagged,
            },
            voice_clone_script: env::var("VOICE_CLONE_SCRIPT")
                .ok()
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
            espeak_path: env::var("ESPEAK_PATH")
                .unwrap_or_else(|_| "espeak".to_string())
                .into(),
        };

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}

fn minutes(count: u64) -> Duration {
    Duration::from_secs(count.saturating_mul(60))
}
