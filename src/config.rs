use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, Result},
    output::NamingMode,
};

/// Main configuration for strike-finder
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Strike detection settings
    #[serde(default)]
    pub detection: DetectionConfig,

    /// Output naming and clip encoding settings
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.detection.validate()?;
        self.output.validate()?;
        Ok(())
    }
}

/// Strike detection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Number of changed pixels (at half resolution) that counts as a strike
    pub threshold: u64,

    /// Request an automatically derived threshold.
    ///
    /// No derivation exists yet: when set, the manual `threshold` is still
    /// used and a warning is logged at batch start.
    pub auto_threshold: bool,

    /// Multiplier reserved for the automatic threshold
    pub auto_threshold_multiplier: f32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            threshold: 5_000_000,
            auto_threshold: false,
            auto_threshold_multiplier: 1.5,
        }
    }
}

impl DetectionConfig {
    fn validate(&self) -> Result<()> {
        if self.threshold == 0 {
            return Err(ConfigError::InvalidValue {
                key: "detection.threshold".to_string(),
                value: self.threshold.to_string()
            }.into());
        }

        if !(self.auto_threshold_multiplier > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "detection.auto_threshold_multiplier".to_string(),
                value: self.auto_threshold_multiplier.to_string()
            }.into());
        }

        Ok(())
    }
}

/// Output naming and clip encoding configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// How still images and clips are suffixed
    pub naming: NamingMode,

    /// Playback rate of written clips, independent of the source rate
    pub clip_fps: f64,

    /// Container extension for clips
    pub clip_extension: String,

    /// ffmpeg video codec used for clips
    pub codec: String,

    /// Subfolder of the output folder receiving still images
    pub frames_dir: String,

    /// Subfolder of the output folder receiving clips
    pub clips_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            naming: NamingMode::FrameNumber,
            clip_fps: 4.0,
            clip_extension: "mp4".to_string(),
            codec: "mpeg4".to_string(),
            frames_dir: "frames".to_string(),
            clips_dir: "mp4".to_string(),
        }
    }
}

impl OutputConfig {
    fn validate(&self) -> Result<()> {
        if !(self.clip_fps > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "output.clip_fps".to_string(),
                value: self.clip_fps.to_string()
            }.into());
        }

        for (key, value) in [
            ("output.clip_extension", &self.clip_extension),
            ("output.codec", &self.codec),
            ("output.frames_dir", &self.frames_dir),
            ("output.clips_dir", &self.clips_dir),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.clone()
                }.into());
            }
        }

        Ok(())
    }
}

/// Immutable settings for one batch run, handed to the worker by value
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub config: Config,
}

impl BatchConfig {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(input_dir: P, output_dir: Q, config: Config) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            config,
        }
    }

    /// Threshold actually used for detection
    pub fn threshold(&self) -> u64 {
        self.config.detection.threshold
    }

    pub fn naming(&self) -> NamingMode {
        self.config.output.naming
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.detection.threshold, 5_000_000);
        assert_eq!(config.output.naming, NamingMode::FrameNumber);
        assert_eq!(config.output.clip_fps, 4.0);
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");

        let mut original_config = Config::default();
        original_config.detection.threshold = 12_345;
        original_config.output.naming = NamingMode::Timestamp;

        original_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(original_config, loaded_config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("partial.toml");
        std::fs::write(&file_path, "[detection]\nthreshold = 2000\n").unwrap();

        let config = Config::from_file(&file_path).unwrap();
        assert_eq!(config.detection.threshold, 2000);
        assert_eq!(config.output, OutputConfig::default());
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempdir().unwrap();
        let result = Config::from_file(dir.path().join("absent.toml"));
        assert!(matches!(
            result,
            Err(crate::error::StrikeError::Config(ConfigError::FileNotFound { .. }))
        ));
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let mut config = Config::default();
        config.detection.threshold = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_clip_fps_rejected() {
        let mut config = Config::default();
        config.output.clip_fps = 0.0;
        assert!(config.validate().is_err());

        config.output.clip_fps = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_clip_dir_rejected() {
        let mut config = Config::default();
        config.output.clips_dir = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
