use std::time::{Duration, Instant};

/// Timing snapshot of the frame being drawn.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Monotonic frame counter, starting at 0 for the first frame.
    pub frame_index: u64,

    /// Timestamp taken when the frame started.
    pub started: Instant,
}

/// Paces the render loop against a fixed per-frame budget.
///
/// Call [`begin`](Self::begin) at the top of an iteration, [`advance`](Self::advance)
/// once the frame has been drawn, and sleep for [`remaining`](Self::remaining)
/// after presenting.
#[derive(Debug, Clone)]
pub struct FrameClock {
    budget: Duration,
    frame_index: u64,
    started: Instant,
}

impl FrameClock {
    pub fn new(budget: Duration) -> Self {
        Self {
            budget,
            frame_index: 0,
            started: Instant::now(),
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Number of frames drawn so far.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Records the start of a frame.
    pub fn begin(&mut self) -> FrameTime {
        self.started = Instant::now();
        FrameTime {
            frame_index: self.frame_index,
            started: self.started,
        }
    }

    /// Counts the current frame as drawn.
    pub fn advance(&mut self) {
        self.frame_index += 1;
    }

    /// Time left in the current frame's budget; zero on overrun.
    pub fn remaining(&self) -> Duration {
        self.budget.saturating_sub(self.started.elapsed())
    }
}
