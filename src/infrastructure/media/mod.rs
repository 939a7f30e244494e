pub mod audio_stitcher;
pub mod ffmpeg_stitcher;

pub use audio_stitcher::{AudioStitcher, StitchError};
pub use ffmpeg_stitcher::{FfmpegStitcher, StitchStrategy};
