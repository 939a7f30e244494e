pub mod chunking;
pub mod generation;
pub mod voice;
