pub mod dto;
pub mod error;
pub mod service;
pub mod workspace;

pub use dto::{GenerationEstimate, GenerationOutcome, GenerationRequest, SynthesisOptions};
pub use error::GenerationError;
pub use service::{GenerationService, GenerationServiceApi, GenerationSettings};
pub use workspace::JobWorkspace;
