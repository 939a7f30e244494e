use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use narrator_backend::controllers::{audio::AudioController, health::HealthController};
use narrator_backend::domain::chunking::{ChunkingConfig, TextChunker};
use narrator_backend::domain::generation::{GenerationService, GenerationSettings};
use narrator_backend::domain::voice::{VoiceCatalog, VoiceProvider};
use narrator_backend::infrastructure::config::{Config, LogFormat};
use narrator_backend::infrastructure::http::{create_router, start_http_server};
use narrator_backend::infrastructure::media::FfmpegStitcher;
use narrator_backend::infrastructure::repositories::{
    EspeakTtsRepository, HuggingFaceTtsRepository, ScriptTtsRepository, TtsBackendRegistry,
};
use narrator_backend::infrastructure::storage::ArtifactJanitor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!("invalid configuration: {}", e))?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        environment = ?config.environment,
        "Starting Narrator Backend on {}:{}",
        config.host,
        config.port
    );

    // Working directories
    for dir in [&config.temp_dir, &config.output_dir] {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("failed to create directory {}", dir.display()))?;
    }

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Instantiate TTS backends, one per provider
    tracing::info!("Instantiating TTS backends...");
    let mut backends = TtsBackendRegistry::new();

    match &config.huggingface_api_key {
        Some(api_key) => {
            let repo = HuggingFaceTtsRepository::new(config.huggingface_api_url.clone(), api_key.clone())
                .context("failed to build Hugging Face client")?;
            backends.register(VoiceProvider::RemoteInference, Arc::new(repo));
        }
        None => {
            tracing::warn!("HUGGINGFACE_API_KEY not set, remote inference voices are disabled");
        }
    }

    backends.register(
        VoiceProvider::LocalModel,
        Arc::new(ScriptTtsRepository::local_model(
            config.python_path.clone(),
            config.local_tts_script.clone(),
            config.local_tts_arg_style,
        )),
    );

    if let Some(script) = &config.voice_clone_script {
        backends.register(
            VoiceProvider::VoiceClone,
            Arc::new(ScriptTtsRepository::voice_clone(config.python_path.clone(), script.clone())),
        );
    }

    backends.register(
        VoiceProvider::System,
        Arc::new(EspeakTtsRepository::new(config.espeak_path.clone())),
    );
    let backends = Arc::new(backends);

    // 2. Instantiate media and storage
    let stitcher = Arc::new(FfmpegStitcher::new(
        config.ffmpeg_path.clone(),
        config.output_dir.clone(),
        config.stitch_strategy,
    ));
    let janitor = ArtifactJanitor::new()
        .with_target(config.output_dir.clone(), config.output_max_age)
        .with_target(config.temp_dir.clone(), config.temp_max_age);

    // 3. Instantiate services
    tracing::info!("Instantiating services...");
    let generation_service = Arc::new(GenerationService::new(
        TextChunker::new(ChunkingConfig {
            max_chunk_size: config.max_chunk_size,
        }),
        Arc::new(VoiceCatalog::builtin()),
        backends.clone(),
        stitcher,
        janitor,
        GenerationSettings::new(config.temp_dir.clone()).with_request_delay(config.request_delay),
    ));

    // 4. Instantiate controllers (inject services)
    tracing::info!("Instantiating controllers...");
    let audio_controller = Arc::new(AudioController::new(
        generation_service.clone(),
        config.temp_dir.clone(),
    ));
    let health_controller = Arc::new(HealthController::new(generation_service));

    // Start HTTP server with all routes
    let router = create_router(&config, audio_controller, health_controller);
    start_http_server(&config, router)
        .await
        .map_err(|e| anyhow::anyhow!("server error: {}", e))?;

    backends.dispose_all().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

fn init_logging(config: &Config) {
    let default_filter = if config.is_development() {
        "narrator_backend=debug,tower_http=debug"
    } else {
        "narrator_backend=info,tower_http=info"
    };

    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| default_filter.into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| default_filter.into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
