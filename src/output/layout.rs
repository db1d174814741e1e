use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::OutputConfig;
use crate::error::Result;
use crate::output::naming::OutputNamer;

/// Folder structure under the output directory
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
    frames_dir: PathBuf,
    clips_dir: PathBuf,
}

impl OutputLayout {
    pub fn new<P: AsRef<Path>>(root: P, config: &OutputConfig) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            frames_dir: root.join(&config.frames_dir),
            clips_dir: root.join(&config.clips_dir),
            root,
        }
    }

    /// Create the frame and clip folders if they are missing
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.frames_dir, &self.clips_dir] {
            if !dir.is_dir() {
                debug!("Creating output folder {}", dir.display());
                std::fs::create_dir_all(dir)?;
            }
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn frames_dir(&self) -> &Path {
        &self.frames_dir
    }

    pub fn clips_dir(&self) -> &Path {
        &self.clips_dir
    }

    /// Prefix of every log line, and of the log file name, for `file_name`
    pub fn log_prefix(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    pub fn namer(&self, clip_extension: &str) -> OutputNamer {
        OutputNamer::new(&self.frames_dir, &self.clips_dir, clip_extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_ensure_dirs_is_idempotent() {
        let dir = tempdir().unwrap();
        let layout = OutputLayout::new(dir.path(), &OutputConfig::default());

        layout.ensure_dirs().unwrap();
        layout.ensure_dirs().unwrap();

        assert!(dir.path().join("frames").is_dir());
        assert!(dir.path().join("mp4").is_dir());
        assert_eq!(layout.log_prefix("a.mp4"), dir.path().join("a.mp4"));
    }
}
