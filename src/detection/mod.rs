//! # Strike Detection
//!
//! Frame differencing, the deadzone state machine and clip buffering.
//! Nothing in here performs I/O.

pub mod diff;
pub mod state;
pub mod buffer;
pub mod detector;

pub use diff::{score, DiffScore};
pub use state::{StrikeState, StrikeTracker, Transition};
pub use buffer::{ClipBuffer, PushOutcome};
pub use detector::{ClipFlush, FrameDecision, StrikeDetector};
