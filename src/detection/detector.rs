use tracing::warn;

use crate::detection::buffer::{ClipBuffer, PushOutcome};
use crate::detection::diff::DiffScore;
use crate::detection::state::StrikeTracker;
use crate::video::Frame;

/// A finished clip together with the frame index it is named after
#[derive(Debug, Clone, PartialEq)]
pub struct ClipFlush {
    /// Index of the most recent strike when the clip was cut
    pub name_index: u64,
    pub frames: Vec<Frame>,
}

/// Everything the caller must persist for one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameDecision {
    pub strike: bool,
    pub save_frame: bool,
    pub clip_flush: Option<ClipFlush>,
    /// The clip buffer hit capacity and was emptied without being written
    pub overflowed: bool,
}

/// Per-video detector: strike tracking plus clip buffering
#[derive(Debug, Clone, Default)]
pub struct StrikeDetector {
    tracker: StrikeTracker,
    buffer: ClipBuffer,
    last_strike: Option<u64>,
}

impl StrikeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tracker(tracker: StrikeTracker) -> Self {
        Self { tracker, ..Self::default() }
    }

    pub fn tracker(&self) -> &StrikeTracker {
        &self.tracker
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Process the score of pair `index`, whose later frame is `frame`.
    ///
    /// A clip for an earlier event is cut before `frame` is buffered, so it
    /// never contains the frame that triggered the flush.
    pub fn process(&mut self, index: u64, score: DiffScore, threshold: u64, frame: &Frame) -> FrameDecision {
        let transition = self.tracker.update(score, threshold);
        let mut decision = FrameDecision {
            strike: transition.strike,
            save_frame: transition.save_frame,
            ..FrameDecision::default()
        };

        if transition.strike {
            self.last_strike = Some(index);
        }

        if transition.flush_clip {
            decision.clip_flush = self.cut_clip();
        }

        if transition.save_frame {
            if let PushOutcome::Overflowed { dropped } = self.buffer.push(frame.clone()) {
                warn!("Clip buffer full at frame {}, discarded {} frames", index, dropped);
                decision.overflowed = true;
            }
        }

        decision
    }

    /// End of the video: write out whatever is still buffered
    pub fn finish(&mut self) -> Option<ClipFlush> {
        let clip = if self.buffer.is_empty() { None } else { self.cut_clip() };
        self.tracker.settle();
        clip
    }

    fn cut_clip(&mut self) -> Option<ClipFlush> {
        let frames = self.buffer.flush();
        if frames.is_empty() {
            return None;
        }
        Some(ClipFlush {
            name_index: self.last_strike.unwrap_or_default(),
            frames,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::buffer::CLIP_CAPACITY;

    const T: u64 = 10_000;

    fn frame(n: u8) -> Frame {
        Frame::new_filled(2, 2, [n, n, n])
    }

    fn run(scores: &[u64]) -> (StrikeDetector, Vec<FrameDecision>) {
        let mut detector = StrikeDetector::new();
        let decisions = scores
            .iter()
            .enumerate()
            .map(|(i, &s)| detector.process(i as u64, s, T, &frame(i as u8)))
            .collect();
        (detector, decisions)
    }

    #[test]
    fn test_single_event_flushes_at_end() {
        let mut scores = vec![0u64; 12];
        scores[3..=5].fill(50_000);
        let (mut detector, decisions) = run(&scores);

        let saved: Vec<usize> = decisions.iter().enumerate()
            .filter(|(_, d)| d.save_frame)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(saved, vec![3, 4, 5, 6, 7]);
        assert!(decisions.iter().all(|d| d.clip_flush.is_none()));
        assert_eq!(detector.tracker().file_strikes(), 3);

        let clip = detector.finish().unwrap();
        assert_eq!(clip.name_index, 5);
        let shades: Vec<u8> = clip.frames.iter().map(|f| f.get_pixel(0, 0)[0]).collect();
        assert_eq!(shades, vec![4, 5, 6, 7]);
        assert_eq!(detector.buffered(), 0);
        assert!(detector.finish().is_none());
    }

    #[test]
    fn test_second_event_flushes_first() {
        let mut scores = vec![0u64; 20];
        scores[2] = 50_000;
        scores[10] = 50_000;
        let (mut detector, decisions) = run(&scores);

        let flushes: Vec<(usize, &ClipFlush)> = decisions.iter().enumerate()
            .filter_map(|(i, d)| d.clip_flush.as_ref().map(|c| (i, c)))
            .collect();
        assert_eq!(flushes.len(), 1);
        let (at, clip) = flushes[0];
        assert_eq!(at, 10);
        assert_eq!(clip.name_index, 10);
        // Event one buffered frames 2, 3, 4; the oldest is dropped
        let shades: Vec<u8> = clip.frames.iter().map(|f| f.get_pixel(0, 0)[0]).collect();
        assert_eq!(shades, vec![3, 4]);

        let last = detector.finish().unwrap();
        let shades: Vec<u8> = last.frames.iter().map(|f| f.get_pixel(0, 0)[0]).collect();
        assert_eq!(shades, vec![11, 12]);
    }

    #[test]
    fn test_long_event_overflows_buffer() {
        let scores = vec![50_000u64; CLIP_CAPACITY + 1];
        let mut detector = StrikeDetector::new();
        let mut overflowed = 0;
        for (i, s) in scores.iter().enumerate() {
            let d = detector.process(i as u64, *s, T, &frame(0));
            assert!(d.save_frame);
            if d.overflowed {
                overflowed += 1;
            }
        }
        assert_eq!(overflowed, 1);
        assert_eq!(detector.buffered(), 0);
        assert!(detector.finish().is_none());
    }

    #[test]
    fn test_quiet_video_produces_nothing() {
        let (mut detector, decisions) = run(&[0; 9]);
        assert!(decisions.iter().all(|d| *d == FrameDecision::default()));
        assert!(detector.finish().is_none());
    }
}
