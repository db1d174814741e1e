//! # Video Module
//!
//! Frame types and the decode/encode capability the detector consumes.
//! Decoding and encoding are delegated to external `ffmpeg`/`ffprobe`.

pub mod types;
pub mod source;
pub mod encoder;
pub mod backend;

pub use types::{Frame, Rejection, VideoMeta};
pub use source::{FfmpegFrameSource, FrameSource, MemoryFrameSource, StillImageSource, probe_video};
pub use encoder::ClipEncoder;
pub use backend::{FfmpegBackend, VideoBackend};

use std::io;
use std::process::{Command, Stdio};

use crate::error::VideoError;

/// Whether `tool -version` runs successfully
pub fn tool_available(tool: &str) -> bool {
    Command::new(tool)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Classify a failed spawn of `tool`: a missing executable is reported as
/// [`VideoError::FfmpegMissing`], anything else goes through `otherwise`.
pub(crate) fn spawn_error<F>(tool: &str, err: io::Error, otherwise: F) -> VideoError
where
    F: FnOnce(io::Error) -> VideoError,
{
    if err.kind() == io::ErrorKind::NotFound {
        VideoError::FfmpegMissing { tool: tool.to_string() }
    } else {
        otherwise(err)
    }
}
