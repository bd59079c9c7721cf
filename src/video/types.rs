use image::{ImageBuffer, Rgba, RgbaImage};
use std::path::PathBuf;

/// RGBA 8-bit pixel grid, row-major, no stride padding
pub type PixelBuffer = RgbaImage;

/// A single frame of a sequence
///
/// Pairs the frame's ordinal position with its pixels and provides the few
/// pixel helpers the pipeline and tests need.
#[derive(Clone, Debug)]
pub struct Frame {
    index: usize,
    buffer: PixelBuffer,
}

impl Frame {
    /// Create a new frame from an RGBA image buffer
    pub fn new(index: usize, buffer: PixelBuffer) -> Self {
        Self { index, buffer }
    }

    /// Create a new frame with the given dimensions filled with the specified color
    pub fn new_filled(index: usize, width: u32, height: u32, color: [u8; 4]) -> Self {
        let buffer = ImageBuffer::from_pixel(width, height, Rgba(color));
        Self { index, buffer }
    }

    /// Position of the frame within its sequence
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// Get a pixel at the given coordinates (returns RGBA array)
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.buffer.get_pixel(x, y).0
    }

    /// Get the underlying image buffer
    pub fn as_image(&self) -> &PixelBuffer {
        &self.buffer
    }

    /// Take ownership of the pixels
    pub fn into_buffer(self) -> PixelBuffer {
        self.buffer
    }

    /// Save the frame as a PNG file
    pub fn save_png<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), image::ImageError> {
        self.buffer.save(path)
    }
}

/// Frame rate and frame count of an extracted sequence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamInfo {
    pub frame_rate: f64,
    pub frame_count: usize,
}

/// Represents an encoded video output
#[derive(Debug, Clone)]
pub struct EncodedVideo {
    pub path: PathBuf,
    pub frame_count: usize,
    pub skipped_frames: usize,
    pub duration: f64,
    pub file_size: u64,
}

/// File extensions treated as video containers
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm"];

/// Check if the given path names a video container by extension
pub fn is_video_file<P: AsRef<std::path::Path>>(path: P) -> bool {
    matches!(
        path.as_ref().extension().and_then(|ext| ext.to_str()),
        Some(ext) if VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filled_frame() {
        let frame = Frame::new_filled(7, 3, 2, [1, 2, 3, 4]);
        assert_eq!(frame.index(), 7);
        assert_eq!((frame.width(), frame.height()), (3, 2));
        assert_eq!(frame.get_pixel(2, 1), [1, 2, 3, 4]);
    }

    #[test]
    fn test_video_extensions() {
        assert!(is_video_file("clip.mp4"));
        assert!(is_video_file("/tmp/CLIP.MOV"));
        assert!(is_video_file("a.webm"));
        assert!(!is_video_file("frame.png"));
        assert!(!is_video_file("frames"));
    }
}
