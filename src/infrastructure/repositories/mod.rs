pub mod espeak_tts_repository;
pub mod huggingface_tts_repository;
pub mod script_tts_repository;
pub mod tts_error;
pub mod tts_repository;

pub use espeak_tts_repository::EspeakTtsRepository;
pub use huggingface_tts_repository::{HuggingFaceTtsRepository, DEFAULT_HUGGINGFACE_API_URL};
pub use script_tts_repository::{ArgStyle, ScriptTtsRepository};
pub use tts_error::{SynthesisFailure, TtsError};
pub use tts_repository::{TtsBackendRegistry, TtsRepository};
