use thiserror::Error;

/// Main error type for the strike-finder library
#[derive(Error, Debug)]
pub enum StrikeError {
    #[error("Video processing error: {0}")]
    Video(#[from] VideoError),

    #[error("Detection error: {0}")]
    Detection(#[from] DetectionError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Video decode/encode errors
#[derive(Error, Debug)]
pub enum VideoError {
    #[error("Failed to open video file: {path}")]
    OpenFailed { path: String },

    #[error("Probe failed for {path}: {reason}")]
    ProbeFailed { path: String, reason: String },

    #[error("Video decoding failed: {reason}")]
    DecodingFailed { reason: String },

    #[error("Video ended after {read} of {expected} frames")]
    Truncated { read: u64, expected: u64 },

    #[error("Clip encoding failed: {reason}")]
    EncodingFailed { reason: String },

    #[error("{tool} not found. Please install FFmpeg and make sure it is on PATH.")]
    FfmpegMissing { tool: String },
}

/// Frame comparison errors
#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("Frame size mismatch: {left_width}x{left_height} vs {right_width}x{right_height}")]
    DimensionMismatch {
        left_width: u32,
        left_height: u32,
        right_width: u32,
        right_height: u32,
    },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Input folder not valid: {path}")]
    InvalidInputFolder { path: String },

    #[error("Output folder not valid: {path}")]
    InvalidOutputFolder { path: String },
}

/// Convenience type alias for Results using StrikeError
pub type Result<T> = std::result::Result<T, StrikeError>;

impl StrikeError {
    /// Configuration problems and missing tools abort the whole batch;
    /// everything else only costs the file that raised it.
    pub fn is_fatal_to_batch(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Video(VideoError::FfmpegMissing { .. }))
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(ConfigError::InvalidInputFolder { .. }) => {
                "Input folder not valid. Select a valid folder.".to_string()
            }
            Self::Config(ConfigError::InvalidOutputFolder { .. }) => {
                "Output folder not valid. Select a valid folder.".to_string()
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            Self::Video(e @ VideoError::FfmpegMissing { .. }) => e.to_string(),
            Self::Video(VideoError::OpenFailed { path }) => {
                format!("Could not open '{}'. Please check the file exists and is a supported format.", path)
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_errors_have_friendly_messages() {
        let err: StrikeError = ConfigError::InvalidInputFolder { path: "/nope".into() }.into();
        assert_eq!(err.user_message(), "Input folder not valid. Select a valid folder.");
        assert!(err.is_fatal_to_batch());

        let err: StrikeError = ConfigError::InvalidOutputFolder { path: "/nope".into() }.into();
        assert_eq!(err.user_message(), "Output folder not valid. Select a valid folder.");
    }

    #[test]
    fn test_per_file_errors_are_not_fatal() {
        let err: StrikeError = VideoError::Truncated { read: 3, expected: 10 }.into();
        assert!(!err.is_fatal_to_batch());
        assert!(err.user_message().contains("3 of 10"));
    }

    #[test]
    fn test_missing_tool_is_fatal() {
        let err: StrikeError = VideoError::FfmpegMissing { tool: "ffprobe".into() }.into();
        assert!(err.is_fatal_to_batch());
        assert!(err.user_message().starts_with("ffprobe not found"));
    }
}
