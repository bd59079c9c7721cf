//! # Video Module
//!
//! Frame types, on-disk frame sequences, and the ffmpeg-backed codec that
//! turns containers into sequences and back.

pub mod codec;
pub mod sequence;
pub mod types;

pub use codec::{FfmpegCodec, FrameCodec};
pub use sequence::{CleanupReport, Sequence};
pub use types::{is_video_file, EncodedVideo, Frame, PixelBuffer, StreamInfo};
