use narrator_backend::controllers::{audio::AudioController, health::HealthController};
use narrator_backend::domain::chunking::TextChunker;
use narrator_backend::domain::generation::{GenerationService, GenerationSettings};
use narrator_backend::domain::voice::{VoiceCatalog, VoiceProvider};
use narrator_backend::infrastructure::config::{Config, Environment, LogFormat};
use narrator_backend::infrastructure::http::create_router;
use narrator_backend::infrastructure::media::StitchStrategy;
use narrator_backend::infrastructure::repositories::{ArgStyle, TtsBackendRegistry};
use narrator_backend::infrastructure::storage::ArtifactJanitor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use test_context::AsyncTestContext;
use tokio::net::TcpListener;

pub mod api_client;

use api_client::TestClient;
use mocks::{MockStitcher, MockTtsRepository};

/// Pipeline wiring shared by the service-level and HTTP tests
pub struct TestPipeline {
    pub service: Arc<GenerationService>,
    pub backend: Arc<MockTtsRepository>,
    pub stitcher: Arc<MockStitcher>,
    pub temp_dir: PathBuf,
    pub output_dir: PathBuf,
    _root: TempDir,
}

impl TestPipeline {
    pub async fn new(backend: MockTtsRepository, max_chunk_size: usize) -> Self {
        Self::with_temp_max_age(backend, max_chunk_size, Duration::from_secs(3600)).await
    }

    pub async fn with_temp_max_age(
        backend: MockTtsRepository,
        max_chunk_size: usize,
        temp_max_age: Duration,
    ) -> Self {
        let root = tempfile::tempdir().expect("Failed to create temp root");
        let temp_dir = root.path().join("temp");
        let output_dir = root.path().join("output");
        tokio::fs::create_dir_all(&temp_dir).await.unwrap();
        tokio::fs::create_dir_all(&output_dir).await.unwrap();

        let backend = Arc::new(backend);
        let stitcher = Arc::new(MockStitcher::new(&output_dir));

        // The mock serves every provider
        let mut backends = TtsBackendRegistry::new();
        for provider in [
            VoiceProvider::RemoteInference,
            VoiceProvider::LocalModel,
            VoiceProvider::VoiceClone,
            VoiceProvider::System,
        ] {
            backends.register(provider, backend.clone());
        }

        let janitor = ArtifactJanitor::new()
            .with_target(output_dir.clone(), Duration::from_secs(3600))
            .with_target(temp_dir.clone(), temp_max_age);

        let service = Arc::new(GenerationService::new(
            TextChunker::with_max_size(max_chunk_size),
            Arc::new(VoiceCatalog::builtin()),
            Arc::new(backends),
            stitcher.clone(),
            janitor,
            GenerationSettings::new(temp_dir.clone()).with_request_delay(Duration::from_secs(1)),
        ));

        Self {
            service,
            backend,
            stitcher,
            temp_dir,
            output_dir,
            _root: root,
        }
    }
}

/// Number of entries directly under `dir`
pub async fn count_entries(dir: &Path) -> usize {
    let mut entries = tokio::fs::read_dir(dir).await.unwrap();
    let mut count = 0;
    while entries.next_entry().await.unwrap().is_some() {
        count += 1;
    }
    count
}

pub fn test_config(output_dir: &Path, temp_dir: &Path) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: Environment::Development,
        log_format: LogFormat::Pretty,
        max_chunk_size: 40,
        max_upload_bytes: 16 * 1024,
        temp_dir: temp_dir.to_path_buf(),
        output_dir: output_dir.to_path_buf(),
        output_max_age: Duration::from_secs(3600),
        temp_max_age: Duration::from_secs(3600),
        request_delay: Duration::ZERO,
        ffmpeg_path: "ffmpeg".into(),
        stitch_strategy: StitchStrategy::Manifest,
        huggingface_api_key: None,
        huggingface_api_url: "http://127.0.0.1:9".to_string(),
        python_path: "python3".into(),
        local_tts_script: "python_tts_server.py".into(),
        local_tts_arg_style: ArgStyle::Flagged,
        voice_clone_script: None,
        espeak_path: "espeak".into(),
    }
}

pub struct TestContext {
    pub client: TestClient,
    pub pipeline: TestPipeline,
    pub config: Config,
}

impl AsyncTestContext for TestContext {
    fn setup() -> impl std::future::Future<Output = Self> + Send {
        async {
            // Local backend, so no inter-request delay slows the HTTP tests
            let pipeline = TestPipeline::new(MockTtsRepository::local(), 40).await;
            let config = test_config(&pipeline.output_dir, &pipeline.temp_dir);

            let audio_controller = Arc::new(AudioController::new(
                pipeline.service.clone(),
                pipeline.temp_dir.clone(),
            ));
            let health_controller = Arc::new(HealthController::new(pipeline.service.clone()));
            let app = create_router(&config, audio_controller, health_controller);

            // Start server
            let listener = TcpListener::bind("127.0.0.1:0")
                .await
                .expect("Failed to bind listener");
            let addr = listener.local_addr().expect("Failed to get local addr");
            let base_url = format!("http://{}", addr);

            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });

            let client = TestClient::new(&base_url);

            Self {
                client,
                pipeline,
                config,
            }
        }
    }

    fn teardown(self) -> impl std::future::Future<Output = ()> + Send {
        async {
            // Directories are removed when the pipeline's TempDir drops
        }
    }
}
