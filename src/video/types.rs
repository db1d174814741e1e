use std::fmt;

use image::{ImageBuffer, Rgb, RgbImage};

/// A single decoded video frame
///
/// Thin wrapper around an RGB image buffer. Frames are produced by a
/// [`FrameSource`](crate::video::FrameSource) and are not modified afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    buffer: RgbImage,
}

impl Frame {
    /// Create a new frame from an RGB image buffer
    pub fn new(buffer: RgbImage) -> Self {
        Self { buffer }
    }

    /// Create a new frame with the given dimensions filled with black
    pub fn new_black(width: u32, height: u32) -> Self {
        Self { buffer: ImageBuffer::new(width, height) }
    }

    /// Create a new frame with the given dimensions filled with the specified color
    pub fn new_filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        let buffer = ImageBuffer::from_pixel(width, height, Rgb(color));
        Self { buffer }
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }

    /// Get a pixel at the given coordinates (returns RGB array)
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.buffer.get_pixel(x, y).0
    }

    /// Get the underlying image buffer
    pub fn as_image(&self) -> &RgbImage {
        &self.buffer
    }

    /// Raw interleaved RGB bytes, row-major
    pub fn as_rgb_bytes(&self) -> &[u8] {
        self.buffer.as_raw()
    }

    /// Create a frame from raw RGB bytes
    pub fn from_rgb_bytes(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        ImageBuffer::from_raw(width, height, data).map(|buffer| Self { buffer })
    }

    /// Save the frame as a PNG file
    pub fn save_png<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), image::ImageError> {
        self.buffer.save_with_format(path, image::ImageFormat::Png)
    }
}

/// Stream properties reported by a decoder for one file
///
/// `frame_count` is signed: decoders report `-1` when the count is unknown,
/// and some streaming containers report garbage negatives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoMeta {
    pub frame_count: i64,
    /// `frame_count` was derived from the duration rather than counted
    pub frame_count_estimated: bool,
    pub width: u32,
    pub height: u32,
    /// Container frame rate truncated to whole frames per second
    pub fps: u32,
}

/// Why a file was not treated as a video
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    ZeroFps,
    SingleFrame,
    BadFrameCount(i64),
    EmptyFrame,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroFps => write!(f, "zero fps"),
            Self::SingleFrame => write!(f, "single frame (still image?)"),
            Self::BadFrameCount(n) => write!(f, "frame count {} is not valid", n),
            Self::EmptyFrame => write!(f, "zero-sized frames"),
        }
    }
}

impl VideoMeta {
    /// Metadata for something that is not a decodable video
    pub fn not_a_video() -> Self {
        Self { frame_count: 0, frame_count_estimated: false, width: 0, height: 0, fps: 0 }
    }

    /// Frame count of `-1` means the decoder could not tell
    pub fn frame_count_known(&self) -> bool {
        self.frame_count >= 0
    }

    /// Reason this stream should be skipped, if any
    pub fn rejection(&self) -> Option<Rejection> {
        if self.fps == 0 {
            Some(Rejection::ZeroFps)
        } else if self.frame_count == 1 {
            Some(Rejection::SingleFrame)
        } else if self.frame_count < -1 {
            Some(Rejection::BadFrameCount(self.frame_count))
        } else if self.width == 0 || self.height == 0 {
            Some(Rejection::EmptyFrame)
        } else {
            None
        }
    }

    /// Number of consecutive frame pairs, when the frame count is known
    pub fn pair_count(&self) -> Option<u64> {
        self.frame_count_known()
            .then(|| (self.frame_count as u64).saturating_sub(1))
    }

    /// Pair count the decoder must deliver; estimated counts are only hints
    pub fn exact_pair_count(&self) -> Option<u64> {
        self.pair_count().filter(|_| !self.frame_count_estimated)
    }

    /// Size in bytes of one rgb24 frame
    pub fn frame_bytes(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}
