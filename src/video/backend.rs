use std::path::Path;

use crate::error::{Result, VideoError};
use crate::video::encoder::ClipEncoder;
use crate::video::source::{FfmpegFrameSource, FrameSource, StillImageSource};
use crate::video::tool_available;
use crate::video::types::Frame;

/// Decode/encode capability consumed by the batch runner
pub trait VideoBackend: Send {
    /// Open a file for frame-by-frame reading
    fn open(&self, path: &Path) -> Result<Box<dyn FrameSource>>;

    /// Encode `frames` into a clip at `path`
    fn write_clip(&self, path: &Path, frames: &[Frame], fps: f64) -> Result<()>;
}

/// Backend built on the `ffmpeg` and `ffprobe` executables
#[derive(Debug, Clone, Default)]
pub struct FfmpegBackend {
    encoder: ClipEncoder,
}

impl FfmpegBackend {
    pub fn new(codec: &str) -> Self {
        Self { encoder: ClipEncoder::new(codec) }
    }

    /// Fail unless both `ffmpeg` and `ffprobe` can be run
    pub fn check_tools() -> Result<()> {
        for tool in ["ffmpeg", "ffprobe"] {
            if !tool_available(tool) {
                return Err(VideoError::FfmpegMissing { tool: tool.to_string() }.into());
            }
        }
        Ok(())
    }
}

impl VideoBackend for FfmpegBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameSource>> {
        if StillImageSource::is_image_file(path) {
            Ok(Box::new(StillImageSource::open(path)?))
        } else {
            Ok(Box::new(FfmpegFrameSource::open(path)?))
        }
    }

    fn write_clip(&self, path: &Path, frames: &[Frame], fps: f64) -> Result<()> {
        self.encoder.encode(path, frames, fps)
    }
}
