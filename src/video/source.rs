use std::collections::VecDeque;
use std::io::{ErrorKind, Read};
use std::ffi::OsString;
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Result, StrikeError, VideoError};
use crate::video::spawn_error;
use crate::video::types::{Frame, VideoMeta};

/// A decoded video, yielding frames in presentation order
pub trait FrameSource {
    fn meta(&self) -> &VideoMeta;

    /// Next frame, or `None` once the stream is exhausted
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

/// A still image presented as a one-frame "video"
///
/// Reports `fps = 0` so the batch runner skips it like any other non-video.
pub struct StillImageSource {
    meta: VideoMeta,
    frame: Option<Frame>,
}

impl StillImageSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|_| VideoError::OpenFailed {
            path: path.display().to_string(),
        })?;
        let frame = Frame::new(image.to_rgb8());

        Ok(Self {
            meta: VideoMeta {
                frame_count: 1,
                frame_count_estimated: false,
                width: frame.width(),
                height: frame.height(),
                fps: 0,
            },
            frame: Some(frame),
        })
    }

    pub fn is_image_file<P: AsRef<Path>>(path: P) -> bool {
        match path.as_ref().extension().and_then(|ext| ext.to_str()) {
            Some(ext) => matches!(
                ext.to_lowercase().as_str(),
                "jpg" | "jpeg" | "png" | "bmp" | "gif" | "tiff" | "webp"
            ),
            None => false,
        }
    }
}

impl FrameSource for StillImageSource {
    fn meta(&self) -> &VideoMeta {
        &self.meta
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        Ok(self.frame.take())
    }
}

/// Frames already held in memory, e.g. produced by another decoder
pub struct MemoryFrameSource {
    meta: VideoMeta,
    frames: VecDeque<Frame>,
}

impl MemoryFrameSource {
    /// `frame_count` in the metadata is taken from the number of frames
    pub fn new(frames: Vec<Frame>, fps: u32) -> Self {
        let (width, height) = frames.first().map(Frame::dimensions).unwrap_or((0, 0));
        let meta = VideoMeta {
            frame_count: frames.len() as i64,
            frame_count_estimated: false,
            width,
            height,
            fps,
        };
        Self::with_meta(meta, frames)
    }

    /// Use explicit metadata, which may disagree with the frames supplied
    pub fn with_meta(meta: VideoMeta, frames: Vec<Frame>) -> Self {
        Self { meta, frames: frames.into() }
    }
}

impl FrameSource for MemoryFrameSource {
    fn meta(&self) -> &VideoMeta {
        &self.meta
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        Ok(self.frames.pop_front())
    }
}

/// Streams rgb24 frames out of an `ffmpeg` child process
pub struct FfmpegFrameSource {
    meta: VideoMeta,
    child: Option<Child>,
    stdout: Option<ChildStdout>,
}

impl FfmpegFrameSource {
    /// Probe `path` and, if it looks like a video, start decoding it.
    ///
    /// Files ffprobe cannot read come back with [`VideoMeta::not_a_video`]
    /// and no decoder attached. A missing `ffprobe` or `ffmpeg` is an error.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let meta = match probe_video(path) {
            Ok(meta) => meta,
            Err(e @ StrikeError::Video(VideoError::FfmpegMissing { .. })) => return Err(e),
            Err(e) => {
                debug!("Probe rejected {}: {}", path.display(), e);
                VideoMeta::not_a_video()
            }
        };

        if meta.rejection().is_some() {
            return Ok(Self { meta, child: None, stdout: None });
        }

        let mut child = Command::new("ffmpeg")
            .args(decode_args(path))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| spawn_error("ffmpeg", e, |e| VideoError::DecodingFailed {
                reason: format!("Failed to spawn ffmpeg for {}: {}", path.display(), e),
            }))?;
        let stdout = child.stdout.take();

        debug!("Decoding {} ({}x{} @ {} fps, {} frames)",
               path.display(), meta.width, meta.height, meta.fps, meta.frame_count);

        Ok(Self { meta, child: Some(child), stdout })
    }
}

/// Decoder arguments. Rotation metadata is ignored so frames keep the
/// coded size ffprobe reported.
fn decode_args(path: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-v", "error", "-nostdin", "-noautorotate", "-i"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(path.as_os_str().to_owned());
    args.extend(["-f", "rawvideo", "-pix_fmt", "rgb24", "-"].into_iter().map(OsString::from));
    args
}

impl FrameSource for FfmpegFrameSource {
    fn meta(&self) -> &VideoMeta {
        &self.meta
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(None);
        };

        let mut data = vec![0u8; self.meta.frame_bytes()];
        match stdout.read_exact(&mut data) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                self.stdout = None;
                return Ok(None);
            }
            Err(e) => {
                return Err(VideoError::DecodingFailed {
                    reason: format!("Reading decoded frame failed: {}", e),
                }.into());
            }
        }

        Frame::from_rgb_bytes(self.meta.width, self.meta.height, data)
            .map(Some)
            .ok_or_else(|| VideoError::DecodingFailed {
                reason: "Decoded frame has the wrong size".to_string(),
            }.into())
    }
}

impl Drop for FfmpegFrameSource {
    fn drop(&mut self) {
        self.stdout = None;
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                if e.kind() != ErrorKind::InvalidInput {
                    warn!("Failed to stop ffmpeg decoder: {}", e);
                }
            }
            let _ = child.wait();
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
}

/// Read stream properties with `ffprobe`
pub fn probe_video<P: AsRef<Path>>(path: P) -> Result<VideoMeta> {
    probe_with("ffprobe", path.as_ref())
}

fn probe_with(program: &str, path: &Path) -> Result<VideoMeta> {
    let output = Command::new(program)
        .args([
            "-v", "quiet",
            "-print_format", "json",
            "-show_streams",
            "-select_streams", "v:0",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .map_err(|e| spawn_error(program, e, |e| VideoError::ProbeFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        }))?;

    if !output.status.success() {
        return Err(VideoError::ProbeFailed {
            path: path.display().to_string(),
            reason: format!("ffprobe exited with {}", output.status),
        }.into());
    }

    parse_probe_output(&output.stdout).map_err(|reason| VideoError::ProbeFailed {
        path: path.display().to_string(),
        reason,
    }.into())
}

fn parse_probe_output(json: &[u8]) -> std::result::Result<VideoMeta, String> {
    let probe: ProbeOutput = serde_json::from_slice(json).map_err(|e| e.to_string())?;
    let Some(stream) = probe.streams.into_iter().next() else {
        return Ok(VideoMeta::not_a_video());
    };

    let rate = stream.avg_frame_rate.as_deref()
        .and_then(parse_rate)
        .filter(|r| *r > 0.0)
        .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_rate))
        .unwrap_or(0.0);

    let counted = stream.nb_frames.as_deref().and_then(|n| n.parse::<i64>().ok());
    let estimated = stream.duration.as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|_| rate > 0.0)
        .map(|duration| (duration * rate).round() as i64);

    let (frame_count, frame_count_estimated) = match (counted, estimated) {
        (Some(n), _) => (n, false),
        (None, Some(n)) => (n, true),
        (None, None) => (-1, false),
    };

    Ok(VideoMeta {
        frame_count,
        frame_count_estimated,
        width: stream.width.unwrap_or(0),
        height: stream.height.unwrap_or(0),
        fps: rate as u32,
    })
}

/// Parse an ffprobe rational such as `30000/1001`
fn parse_rate(rate: &str) -> Option<f64> {
    match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            (den != 0.0).then(|| num / den)
        }
        None => rate.trim().parse().ok(),
    }
}
