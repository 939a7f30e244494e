pub mod chunker;

pub use chunker::{ChunkStats, ChunkingConfig, TextChunk, TextChunker, DEFAULT_MAX_CHUNK_SIZE};
