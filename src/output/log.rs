use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::detection::DiffScore;
use crate::error::Result;

/// Per-video CSV of raw diff scores, one line per frame pair
///
/// Every line is flushed as soon as it is written, so an interrupted run
/// leaves a truncated but well-formed file.
pub struct ScoreLog {
    writer: BufWriter<File>,
    prefix: String,
    path: PathBuf,
    lines: u64,
}

impl ScoreLog {
    /// Create `<prefix>.csv`, where `prefix` is `<output_dir>/<input file name>`
    pub fn create<P: AsRef<Path>>(prefix: P) -> Result<Self> {
        let prefix = prefix.as_ref();
        let mut path = prefix.as_os_str().to_owned();
        path.push(".csv");
        let path = PathBuf::from(path);

        let file = File::create(&path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            prefix: prefix.display().to_string(),
            path,
            lines: 0,
        })
    }

    pub fn record(&mut self, score: DiffScore) -> Result<()> {
        writeln!(self.writer, "{}, {}", self.prefix, score)?;
        self.writer.flush()?;
        self.lines += 1;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lines(&self) -> u64 {
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_lines_are_written_immediately() {
        let dir = tempdir().unwrap();
        let prefix = dir.path().join("storm.mp4");
        let mut log = ScoreLog::create(&prefix).unwrap();
        assert_eq!(log.path(), dir.path().join("storm.mp4.csv"));

        log.record(0).unwrap();
        log.record(51234).unwrap();

        // Read while the log is still open
        let content = std::fs::read_to_string(log.path()).unwrap();
        let expected = format!("{p}, 0\n{p}, 51234\n", p = prefix.display());
        assert_eq!(content, expected);
        assert_eq!(log.lines(), 2);
    }

    #[test]
    fn test_unwritable_location_fails() {
        let dir = tempdir().unwrap();
        let result = ScoreLog::create(dir.path().join("missing").join("video.mp4"));
        assert!(result.is_err());
    }
}
