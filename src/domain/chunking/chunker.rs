use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const DEFAULT_MAX_CHUNK_SIZE: usize = 500;

/// A bounded-size, index-ordered piece of the input text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    pub index: usize,
    pub text: String,
}

impl TextChunk {
    /// Length in characters, which is what the size limit is measured in
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    pub max_chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkStats {
    pub total_chunks: usize,
    pub average_chunk_length: usize,
    pub max_chunk_length: usize,
}

/// Sentence-like units: anything up to and including a run of terminators.
fn sentence_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^.!?\n]*[.!?\n]+").expect("sentence pattern is valid"))
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Splits long text into chunks at natural pauses so that no chunk exceeds
/// the configured size, unless a single word is longer than the limit.
#[derive(Debug, Clone, Default)]
pub struct TextChunker {
    config: ChunkingConfig,
}

impl TextChunker {
    pub fn new(config: ChunkingConfig) -> Self {
        // A zero limit would turn every word into an oversized token
        let max_chunk_size = config.max_chunk_size.max(1);
        Self {
            config: ChunkingConfig { max_chunk_size },
        }
    }

    pub fn with_max_size(max_chunk_size: usize) -> Self {
        Self::new(ChunkingConfig { max_chunk_size })
    }

    pub fn max_chunk_size(&self) -> usize {
        self.config.max_chunk_size
    }

    /// Split text into chunks at sentence, clause and word boundaries
    pub fn chunk(&self, text: &str) -> Vec<TextChunk> {
        let max = self.config.max_chunk_size;
        let mut builder = ChunkBuilder::new(max);

        for unit in split_sentences(text) {
            let unit = unit.trim();
            if unit.is_empty() {
                continue;
            }

            let unit_len = char_len(unit);
            builder.flush_if_overflowing(unit_len);

            if unit_len > max {
                for part in self.split_long_sentence(unit) {
                    builder.flush_if_overflowing(char_len(&part));
                    builder.append(&part);
                }
            } else {
                builder.append(unit);
            }
        }

        builder.finish()
    }

    /// Break an oversized sentence on commas, then on whitespace
    fn split_long_sentence(&self, sentence: &str) -> Vec<String> {
        let max = self.config.max_chunk_size;
        let mut parts = Vec::new();

        for clause in sentence.split_inclusive(',') {
            let clause = clause.trim();
            if clause.is_empty() {
                continue;
            }

            if char_len(clause) <= max {
                parts.push(clause.to_string());
                continue;
            }

            let mut current = String::new();
            let mut current_len = 0;
            for word in clause.split_whitespace() {
                let word_len = char_len(word);
                if current_len > 0 && current_len + 1 + word_len > max {
                    parts.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                if current_len > 0 {
                    current.push(' ');
                    current_len += 1;
                }
                current.push_str(word);
                current_len += word_len;
            }
            if current_len > 0 {
                parts.push(current);
            }
        }

        parts
    }

    /// Chunk the text and aggregate lengths. `None` when there are no chunks.
    pub fn stats(&self, text: &str) -> Option<ChunkStats> {
        let lengths: Vec<usize> = self.chunk(text).iter().map(TextChunk::len).collect();
        let max_chunk_length = *lengths.iter().max()?;
        let total: usize = lengths.iter().sum();

        Some(ChunkStats {
            total_chunks: lengths.len(),
            average_chunk_length: (total as f64 / lengths.len() as f64).round() as usize,
            max_chunk_length,
        })
    }
}

/// Running buffer that hands out contiguous indices as chunks are flushed.
struct ChunkBuilder {
    max: usize,
    chunks: Vec<TextChunk>,
    buffer: String,
    buffer_len: usize,
}

impl ChunkBuilder {
    fn new(max: usize) -> Self {
        Self {
            max,
            chunks: Vec::new(),
            buffer: String::new(),
            buffer_len: 0,
        }
    }

    /// Flush the buffer if appending `unit_len` more characters would overflow it
    fn flush_if_overflowing(&mut self, unit_len: usize) {
        if self.buffer_len > 0 && self.buffer_len + 1 + unit_len > self.max {
            self.flush();
        }
    }

    fn append(&mut self, unit: &str) {
        if self.buffer_len > 0 {
            self.buffer.push(' ');
            self.buffer_len += 1;
        }
        self.buffer.push_str(unit);
        self.buffer_len += char_len(unit);
    }

    fn flush(&mut self) {
        if self.buffer_len == 0 {
            return;
        }
        self.chunks.push(TextChunk {
            index: self.chunks.len(),
            text: std::mem::take(&mut self.buffer),
        });
        self.buffer_len = 0;
    }

    fn finish(mut self) -> Vec<TextChunk> {
        self.flush();
        self.chunks
    }
}

/// Greedy non-overlapping sentence matches, plus whatever trails the last
/// terminator. Text without any terminator is a single unit.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut units = Vec::new();
    let mut last_end = 0;

    for mat in sentence_pattern().find_iter(text) {
        units.push(&text[last_end..mat.end()]);
        last_end = mat.end();
    }

    if last_end < text.len() {
        units.push(&text[last_end..]);
    }

    units
}
