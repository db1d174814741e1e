use crate::detection::diff::DiffScore;

/// Frames an event stays open after the score falls below the low bound
pub const DEADZONE_FRAMES: u8 = 3;

/// Fraction of the threshold the score must drop under to start closing an event
pub const END_STRIKE_RATIO: f64 = 0.9;

/// Hysteresis state for one video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrikeState {
    /// No event in progress
    #[default]
    Quiet,
    /// Inside an event, or closing one; `remaining` is in `1..=DEADZONE_FRAMES`
    Active { remaining: u8 },
}

impl StrikeState {
    /// The deadzone countdown, 0 when quiet
    pub fn deadzone(&self) -> u8 {
        match self {
            Self::Quiet => 0,
            Self::Active { remaining } => *remaining,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    fn refreshed() -> Self {
        Self::Active { remaining: DEADZONE_FRAMES }
    }

    fn decayed(self) -> Self {
        match self {
            Self::Active { remaining } if remaining > 1 => Self::Active { remaining: remaining - 1 },
            _ => Self::Quiet,
        }
    }
}

/// What the tracker decided about one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Transition {
    /// The score crossed the threshold
    pub strike: bool,
    /// A previous event's buffered frames should be written out now
    pub flush_clip: bool,
    /// The current frame belongs to an event
    pub save_frame: bool,
}

/// Strike counters and hysteresis for one video
#[derive(Debug, Clone, Default)]
pub struct StrikeTracker {
    state: StrikeState,
    file_strikes: u64,
    total_strikes: u64,
}

impl StrikeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a tracker whose batch-wide counter continues from `total_strikes`
    pub fn continuing(total_strikes: u64) -> Self {
        Self { total_strikes, ..Self::default() }
    }

    pub fn state(&self) -> StrikeState {
        self.state
    }

    pub fn deadzone(&self) -> u8 {
        self.state.deadzone()
    }

    pub fn file_strikes(&self) -> u64 {
        self.file_strikes
    }

    pub fn total_strikes(&self) -> u64 {
        self.total_strikes
    }

    /// Feed one score through the state machine.
    ///
    /// Checks run in a fixed order: strike, then decay, then save.
    pub fn update(&mut self, score: DiffScore, threshold: u64) -> Transition {
        let mut transition = Transition::default();

        if score > threshold {
            self.total_strikes += 1;
            self.file_strikes += 1;
            transition.strike = true;
            // The first strike of a file has no earlier event to close
            transition.flush_clip = !self.state.is_active() && self.file_strikes > 1;
            self.state = StrikeState::refreshed();
        }

        if (score as f64) < threshold as f64 * END_STRIKE_RATIO {
            self.state = self.state.decayed();
        }

        transition.save_frame = self.state.is_active();
        transition
    }

    /// Force the state back to quiet, keeping the counters
    pub fn settle(&mut self) {
        self.state = StrikeState::Quiet;
    }
}
