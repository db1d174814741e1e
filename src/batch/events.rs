use std::fmt;

use chrono::{DateTime, Local};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::video::VideoMeta;

/// Messages sent from the batch worker to whoever is watching it
#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// Overall completion, 0-100, never decreasing within a batch
    Progress(u8),
    FileStarted { index: usize, total: usize, name: String },
    FileSkipped(SkippedFile),
    FileFinished(FileReport),
    FileFailed(FileFailure),
    /// Human-readable message for the user
    Error(String),
    /// Always the last event of a batch
    Finished(BatchSummary),
}

pub type EventSender = UnboundedSender<BatchEvent>;
pub type EventReceiver = UnboundedReceiver<BatchEvent>;

pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// Worker-side handle on the event channel
///
/// A receiver that went away is not an error: the batch still runs to
/// completion.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: EventSender,
    last_progress: Option<u8>,
}

impl EventSink {
    pub fn new(tx: EventSender) -> Self {
        Self { tx, last_progress: None }
    }

    pub fn send(&self, event: BatchEvent) {
        let _ = self.tx.send(event);
    }

    /// Report overall progress in percent.
    ///
    /// Values are truncated to whole percent; anything not above the last
    /// reported value is dropped.
    pub fn progress(&mut self, percent: f64) {
        let percent = percent.clamp(0.0, 100.0).floor() as u8;
        if self.last_progress.map_or(true, |last| percent > last) {
            self.last_progress = Some(percent);
            self.send(BatchEvent::Progress(percent));
        }
    }

    pub fn error<S: Into<String>>(&self, message: S) {
        self.send(BatchEvent::Error(message.into()));
    }
}

/// Results for one processed video
#[derive(Debug, Clone, PartialEq)]
pub struct FileReport {
    pub name: String,
    pub meta: VideoMeta,
    /// Frame pairs scored, equal to the number of log lines
    pub pairs: u64,
    pub strikes: u64,
    pub images: u64,
    pub clips: u64,
    /// Times the clip buffer hit capacity and was dropped
    pub overflows: u64,
    /// Stopped early on a cancel request
    pub cancelled: bool,
}

impl FileReport {
    pub fn new<S: Into<String>>(name: S, meta: VideoMeta) -> Self {
        Self {
            name: name.into(),
            meta,
            pairs: 0,
            strikes: 0,
            images: 0,
            clips: 0,
            overflows: 0,
            cancelled: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFile {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileFailure {
    pub name: String,
    pub error: String,
}

/// Outcome of a whole batch
#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub started_at: DateTime<Local>,
    pub finished_at: Option<DateTime<Local>>,
    /// Directory entries considered
    pub entries: usize,
    pub processed: Vec<FileReport>,
    pub skipped: Vec<SkippedFile>,
    pub failures: Vec<FileFailure>,
    pub total_strikes: u64,
    /// Set when the batch stopped before looking at any file
    pub aborted: Option<String>,
    pub cancelled: bool,
}

impl BatchSummary {
    pub fn start() -> Self {
        Self {
            started_at: Local::now(),
            finished_at: None,
            entries: 0,
            processed: Vec::new(),
            skipped: Vec::new(),
            failures: Vec::new(),
            total_strikes: 0,
            aborted: None,
            cancelled: false,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Local::now());
    }

    pub fn images(&self) -> u64 {
        self.processed.iter().map(|r| r.images).sum()
    }

    pub fn clips(&self) -> u64 {
        self.processed.iter().map(|r| r.clips).sum()
    }

    /// Everything that was attempted worked
    pub fn is_success(&self) -> bool {
        self.aborted.is_none() && self.failures.is_empty()
    }

    pub fn elapsed_secs(&self) -> f64 {
        let end = self.finished_at.unwrap_or_else(Local::now);
        (end - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} processed, {} skipped, {} failed; {} strikes, {} images, {} clips in {:.1}s",
            self.processed.len(),
            self.skipped.len(),
            self.failures.len(),
            self.total_strikes,
            self.images(),
            self.clips(),
            self.elapsed_secs(),
        )
    }
}
