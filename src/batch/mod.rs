//! # Batch Processing
//!
//! Runs detection over a folder of videos on a single worker and reports
//! back over a channel.

pub mod cancel;
pub mod events;
pub mod runner;

pub use cancel::CancelFlag;
pub use events::{
    channel, BatchEvent, BatchSummary, EventReceiver, EventSender, EventSink, FileFailure,
    FileReport, SkippedFile,
};
pub use runner::BatchRunner;
