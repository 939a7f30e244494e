use serde::{Deserialize, Serialize};

/// Which family of TTS backend serves a voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VoiceProvider {
    RemoteInference,
    LocalModel,
    VoiceClone,
    System,
}

impl VoiceProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceProvider::RemoteInference => "remote-inference",
            VoiceProvider::LocalModel => "local-model",
            VoiceProvider::VoiceClone => "voice-clone",
            VoiceProvider::System => "system",
        }
    }
}

impl std::fmt::Display for VoiceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceModel {
    pub id: String,
    pub name: String,
    pub description: String,
    pub provider: VoiceProvider,
    pub requires_reference_audio: bool,
}

impl VoiceModel {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        provider: VoiceProvider,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            provider,
            requires_reference_audio: false,
        }
    }

    pub fn requiring_reference_audio(mut self) -> Self {
        self.requires_reference_audio = true;
        self
    }
}
