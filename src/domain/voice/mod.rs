pub mod catalog;
pub mod model;

pub use catalog::VoiceCatalog;
pub use model::{VoiceModel, VoiceProvider};
