//! # Strike-Finder
//!
//! Find lightning strikes (or any short, bright event) in folders of video.
//!
//! For every video in a folder the library scores the change between each
//! pair of consecutive frames, tracks strike events with a small hysteresis
//! window, and writes out:
//!
//! - a PNG still for every frame inside an event (`frames/`)
//! - a short clip per event (`mp4/`)
//! - a CSV log of the change score of every frame pair
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use strike_finder::{
//!     batch::{channel, BatchRunner},
//!     config::{BatchConfig, Config},
//!     video::FfmpegBackend,
//! };
//!
//! let config = BatchConfig::new("videos/", "results/", Config::default());
//! let (tx, _rx) = channel();
//!
//! let summary = BatchRunner::new(FfmpegBackend::default(), config, tx).run();
//! println!("{}", summary);
//! ```
//!
//! ## Architecture
//!
//! - [`video`] - Frames, stream metadata and the ffmpeg decode/encode backend
//! - [`detection`] - Frame differencing, strike state machine, clip buffering
//! - [`output`] - Output naming, score logs and folder layout
//! - [`batch`] - The folder-level runner, progress events and cancellation
//! - [`config`] - Configuration management
//!
//! ## Custom Backends
//!
//! Decoding is behind the [`VideoBackend`](video::VideoBackend) trait, so
//! frames can come from anywhere:
//!
//! ```rust,no_run
//! use std::path::Path;
//! use strike_finder::video::{Frame, FrameSource, MemoryFrameSource, VideoBackend};
//! use strike_finder::Result;
//!
//! struct TestPattern;
//!
//! impl VideoBackend for TestPattern {
//!     fn open(&self, _path: &Path) -> Result<Box<dyn FrameSource>> {
//!         Ok(Box::new(MemoryFrameSource::new(vec![Frame::new_black(64, 64); 10], 30)))
//!     }
//!
//!     fn write_clip(&self, _path: &Path, _frames: &[Frame], _fps: f64) -> Result<()> {
//!         Ok(())
//!     }
//! }
//! ```

pub mod batch;
pub mod config;
pub mod detection;
pub mod error;
pub mod output;
pub mod video;

// Re-export commonly used types for convenience
pub use crate::{
    batch::{BatchEvent, BatchRunner, BatchSummary, CancelFlag},
    config::{BatchConfig, Config},
    error::{Result, StrikeError},
    output::NamingMode,
};
