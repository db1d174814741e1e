use std::fmt;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// How still images and clips are suffixed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum NamingMode {
    /// `_000123`: zero-padded frame index
    #[default]
    FrameNumber,
    /// `_4-1`: seconds into the video, two decimals, `.` replaced by `-`
    Timestamp,
}

impl fmt::Display for NamingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FrameNumber => write!(f, "frame-number"),
            Self::Timestamp => write!(f, "timestamp"),
        }
    }
}

/// Destination of the still and the clip for one frame index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub image: PathBuf,
    pub clip: PathBuf,
}

/// Derives output file names for frames and clips
#[derive(Debug, Clone)]
pub struct OutputNamer {
    frames_dir: PathBuf,
    clips_dir: PathBuf,
    clip_extension: String,
}

impl OutputNamer {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(frames_dir: P, clips_dir: Q, clip_extension: &str) -> Self {
        Self {
            frames_dir: frames_dir.into(),
            clips_dir: clips_dir.into(),
            clip_extension: clip_extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn frames_dir(&self) -> &Path {
        &self.frames_dir
    }

    pub fn clips_dir(&self) -> &Path {
        &self.clips_dir
    }

    /// Paths for `frame_index` of the video called `base_filename`.
    ///
    /// `base_filename` is sanitized first. Timestamp mode with `fps == 0`
    /// falls back to frame numbers.
    pub fn name_for(&self, base_filename: &str, frame_index: u64, fps: u32, mode: NamingMode) -> OutputPaths {
        let stem = format!("{}_{}", sanitize_base(base_filename), suffix(frame_index, fps, mode));
        OutputPaths {
            image: self.frames_dir.join(format!("{}.png", stem)),
            clip: self.clips_dir.join(format!("{}.{}", stem, self.clip_extension)),
        }
    }
}

/// Replace periods so extensions in the input name do not leak into outputs
pub fn sanitize_base(name: &str) -> String {
    name.replace('.', "_")
}

fn suffix(frame_index: u64, fps: u32, mode: NamingMode) -> String {
    match mode {
        NamingMode::Timestamp if fps > 0 => {
            format_seconds(frame_index as f64 / fps as f64).replace('.', "-")
        }
        _ => format!("{:06}", frame_index),
    }
}

/// Seconds rounded to two decimals, printed with the shortest fraction
/// that keeps at least one digit (`3.0`, `1.1`, `3.14`).
fn format_seconds(seconds: f64) -> String {
    let hundredths = round_hundredths(seconds);
    let fraction = format!("{:02}", hundredths % 100);
    let fraction = match fraction.trim_end_matches('0') {
        "" => "0",
        trimmed => trimmed,
    };
    format!("{}.{}", hundredths / 100, fraction)
}

/// `seconds * 100` rounded half-to-even on the exact binary value, so
/// `0.125` gives `12` while `0.135` (stored slightly above) gives `14`.
fn round_hundredths(seconds: f64) -> u64 {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }

    // seconds == mantissa * 2^exponent exactly
    let bits = seconds.to_bits();
    let raw_exponent = ((bits >> 52) & 0x7ff) as i32;
    let fraction_bits = bits & ((1u64 << 52) - 1);
    let (mantissa, exponent) = if raw_exponent == 0 {
        (fraction_bits, -1074)
    } else {
        (fraction_bits | (1u64 << 52), raw_exponent - 1075)
    };

    let scaled = mantissa as u128 * 100;
    if exponent >= 0 {
        return (scaled << exponent.min(64)) as u64;
    }

    let shift = (-exponent) as u32;
    if shift >= 127 {
        return 0;
    }
    let quotient = scaled >> shift;
    let remainder = scaled & ((1u128 << shift) - 1);
    let half = 1u128 << (shift - 1);

    let rounded = if remainder > half || (remainder == half && quotient % 2 == 1) {
        quotient + 1
    } else {
        quotient
    };
    rounded as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn namer() -> OutputNamer {
        OutputNamer::new("/out/frames", "/out/mp4", "mp4")
    }

    #[test]
    fn test_frame_number_mode() {
        let paths = namer().name_for("storm.cam1.mp4", 42, 30, NamingMode::FrameNumber);
        assert_eq!(paths.image, PathBuf::from("/out/frames/storm_cam1_mp4_000042.png"));
        assert_eq!(paths.clip, PathBuf::from("/out/mp4/storm_cam1_mp4_000042.mp4"));
    }

    #[test]
    fn test_timestamp_mode() {
        let n = namer();
        let paths = n.name_for("storm.mp4", 94, 30, NamingMode::Timestamp);
        assert_eq!(paths.image, PathBuf::from("/out/frames/storm_mp4_3-13.png"));

        let paths = n.name_for("storm.mp4", 90, 30, NamingMode::Timestamp);
        assert_eq!(paths.clip, PathBuf::from("/out/mp4/storm_mp4_3-0.mp4"));

        let paths = n.name_for("storm.mp4", 33, 30, NamingMode::Timestamp);
        assert_eq!(paths.image, PathBuf::from("/out/frames/storm_mp4_1-1.png"));
    }

    #[test]
    fn test_timestamp_ties_round_to_even() {
        let n = namer();
        // 1/8 s is exactly 0.125
        let paths = n.name_for("v", 1, 8, NamingMode::Timestamp);
        assert_eq!(paths.image, PathBuf::from("/out/frames/v_0-12.png"));
        // 3/8 s is exactly 0.375
        let paths = n.name_for("v", 3, 8, NamingMode::Timestamp);
        assert_eq!(paths.image, PathBuf::from("/out/frames/v_0-38.png"));
    }

    #[test]
    fn test_round_hundredths_uses_stored_value() {
        assert_eq!(round_hundredths(0.0), 0);
        assert_eq!(round_hundredths(3.0), 300);
        assert_eq!(round_hundredths(94.0 / 30.0), 313);
        assert_eq!(round_hundredths(0.125), 12);
        assert_eq!(round_hundredths(0.625), 62);
        // Neither is an exact tie once stored as f64
        assert_eq!(round_hundredths(2.675), 267);
        assert_eq!(round_hundredths(0.135), 14);
        assert_eq!(round_hundredths(1234.5), 123450);
    }

    #[test]
    fn test_format_seconds_shortest_fraction() {
        assert_eq!(format_seconds(3.0), "3.0");
        assert_eq!(format_seconds(1.1), "1.1");
        assert_eq!(format_seconds(3.14159), "3.14");
        assert_eq!(format_seconds(0.07), "0.07");
        assert_eq!(format_seconds(61.5), "61.5");
    }

    #[test]
    fn test_timestamp_without_fps_falls_back() {
        let n = namer();
        assert_eq!(
            n.name_for("a.mov", 7, 0, NamingMode::Timestamp),
            n.name_for("a.mov", 7, 0, NamingMode::FrameNumber)
        );
    }

    #[test]
    fn test_naming_is_deterministic() {
        let n = namer();
        for mode in [NamingMode::FrameNumber, NamingMode::Timestamp] {
            assert_eq!(n.name_for("x.y.z", 1234, 24, mode), n.name_for("x.y.z", 1234, 24, mode));
        }
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(0.0), "0.0");
        assert_eq!(format_seconds(3.14159), "3.14");
        assert_eq!(format_seconds(1.1), "1.1");
        assert_eq!(format_seconds(2.999), "3.0");
        assert_eq!(format_seconds(125.5), "125.5");
    }

    #[test]
    fn test_extension_dot_is_optional() {
        let n = OutputNamer::new("f", "c", ".avi");
        let paths = n.name_for("v", 1, 25, NamingMode::FrameNumber);
        assert_eq!(paths.clip, PathBuf::from("c/v_000001.avi"));
    }
}
