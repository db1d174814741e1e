use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{Result, VideoError};
use crate::video::spawn_error;
use crate::video::types::Frame;

/// Writes short clips by piping raw frames into an external `ffmpeg`
#[derive(Debug, Clone)]
pub struct ClipEncoder {
    codec: String,
}

impl ClipEncoder {
    pub fn new<S: Into<String>>(codec: S) -> Self {
        Self { codec: codec.into() }
    }

    /// Encode `frames` to `output_path` at `fps`.
    ///
    /// Every frame must share the first frame's dimensions.
    pub fn encode<P: AsRef<Path>>(&self, output_path: P, frames: &[Frame], fps: f64) -> Result<()> {
        let output_path = output_path.as_ref();
        let Some(first) = frames.first() else {
            return Err(VideoError::EncodingFailed {
                reason: "No frames to encode".to_string(),
            }.into());
        };
        let (width, height) = first.dimensions();

        if let Some(odd) = frames.iter().find(|f| f.dimensions() != (width, height)) {
            return Err(VideoError::EncodingFailed {
                reason: format!("Frame size {}x{} differs from clip size {}x{}",
                                odd.width(), odd.height(), width, height),
            }.into());
        }

        debug!("Encoding {} frames ({}x{}) to {}", frames.len(), width, height, output_path.display());

        let mut child = Command::new("ffmpeg")
            .args([
                "-v", "error",
                "-f", "rawvideo",
                "-pix_fmt", "rgb24",
                "-s", &format!("{}x{}", width, height),
                "-r", &fps.to_string(),
                "-i", "-",
                "-c:v", &self.codec,
                "-pix_fmt", "yuv420p",
                "-y",
            ])
            .arg(output_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| spawn_error("ffmpeg", e, |e| VideoError::EncodingFailed {
                reason: format!("Failed to spawn FFmpeg process: {}", e),
            }))?;

        if let Some(mut stdin) = child.stdin.take() {
            for frame in frames {
                stdin.write_all(frame.as_rgb_bytes()).map_err(|e| VideoError::EncodingFailed {
                    reason: format!("Writing frame to FFmpeg failed: {}", e),
                })?;
            }
        }

        let output = child.wait_with_output().map_err(|e| VideoError::EncodingFailed {
            reason: format!("FFmpeg execution failed: {}", e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VideoError::EncodingFailed {
                reason: format!("FFmpeg failed: {}", stderr),
            }.into());
        }

        Ok(())
    }
}

impl Default for ClipEncoder {
    fn default() -> Self {
        Self::new("mpeg4")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_clip_is_rejected() {
        let encoder = ClipEncoder::default();
        let result = encoder.encode("unused.mp4", &[], 4.0);
        assert!(matches!(
            result,
            Err(crate::error::StrikeError::Video(VideoError::EncodingFailed { .. }))
        ));
    }

    #[test]
    fn test_mixed_frame_sizes_are_rejected() {
        let encoder = ClipEncoder::default();
        let frames = vec![Frame::new_black(4, 4), Frame::new_black(8, 8)];
        let result = encoder.encode("unused.mp4", &frames, 4.0);
        assert!(result.is_err());
    }
}
