use super::model::{VoiceModel, VoiceProvider};

/// Read-only list of the voices the service can narrate with
#[derive(Debug, Clone)]
pub struct VoiceCatalog {
    voices: Vec<VoiceModel>,
}

impl VoiceCatalog {
    pub fn new(voices: Vec<VoiceModel>) -> Self {
        Self { voices }
    }

    /// The voices shipped with the service, one or more per provider
    pub fn builtin() -> Self {
        Self::new(vec![
            VoiceModel::new(
                "facebook/mms-tts-eng",
                "Narrator 1 - Clear",
                "Clear and professional English narrator",
                VoiceProvider::RemoteInference,
            ),
            VoiceModel::new(
                "facebook/fastspeech2-en-ljspeech",
                "Narrator 2 - Natural",
                "Natural and expressive voice",
                VoiceProvider::RemoteInference,
            ),
            VoiceModel::new(
                "espnet/kan-bayashi_ljspeech_vits",
                "Narrator 3 - Deep",
                "Deep and authoritative tone",
                VoiceProvider::RemoteInference,
            ),
            VoiceModel::new(
                "coqui-tacotron2",
                "Professional Narrator",
                "High-quality professional narrator using Tacotron2",
                VoiceProvider::LocalModel,
            ),
            VoiceModel::new(
                "kani-andrew",
                "Storyteller - Andrew",
                "Warm storytelling voice generated locally",
                VoiceProvider::LocalModel,
            ),
            VoiceModel::new(
                "voice_clone_xtts",
                "Cloned Narrator",
                "Narrates in the voice of an uploaded reference recording",
                VoiceProvider::VoiceClone,
            )
            .requiring_reference_audio(),
            VoiceModel::new(
                "fallback-narrator-1",
                "System Narrator",
                "Clear system voice (always available)",
                VoiceProvider::System,
            ),
        ])
    }

    pub fn list(&self) -> &[VoiceModel] {
        &self.voices
    }

    pub fn find(&self, id: &str) -> Option<&VoiceModel> {
        self.voices.iter().find(|voice| voice.id == id)
    }
}

impl Default for VoiceCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
