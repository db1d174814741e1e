//! # Output Module
//!
//! Where detection results land on disk: file naming, the per-video score
//! log and the output folder layout.

pub mod naming;
pub mod log;
pub mod layout;

pub use naming::{sanitize_base, NamingMode, OutputNamer, OutputPaths};
pub use log::ScoreLog;
pub use layout::OutputLayout;
