use std::collections::VecDeque;

use crate::video::Frame;

/// Largest number of frames one clip may collect
pub const CLIP_CAPACITY: usize = 100;

/// Result of pushing a frame into a [`ClipBuffer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Buffered,
    /// The buffer was already full; it was emptied and the frame discarded
    Overflowed { dropped: usize },
}

/// Bounded FIFO of frames waiting to become a clip
#[derive(Debug, Clone)]
pub struct ClipBuffer {
    frames: VecDeque<Frame>,
    capacity: usize,
}

impl ClipBuffer {
    pub fn new() -> Self {
        Self::with_capacity(CLIP_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, frame: Frame) -> PushOutcome {
        if self.frames.len() >= self.capacity {
            let dropped = self.frames.len();
            self.frames.clear();
            return PushOutcome::Overflowed { dropped };
        }
        self.frames.push_back(frame);
        PushOutcome::Buffered
    }

    /// Drain the buffer, discarding its oldest frame
    pub fn flush(&mut self) -> Vec<Frame> {
        self.frames.pop_front();
        self.frames.drain(..).collect()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ClipBuffer {
    fn default() -> Self {
        Self::new()
    }
}
