use std::fmt;
use std::time::{Duration, Instant};

const FRAMES: [&str; 7] = ["   ", ".  ", ".. ", "...", " ..", "  .", "   "];

/// Dot animation shown while the walk is in progress.
#[derive(Debug, Clone)]
pub struct Spinner {
    frame: usize,
    throttle: Duration,
    last_update: Option<Instant>,
}

impl Spinner {
    pub fn new() -> Self {
        Self {
            frame: 0,
            throttle: Duration::from_millis(50),
            last_update: None,
        }
    }

    /// Advance one frame, unless the previous advance was too recent.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    fn tick_at(&mut self, now: Instant) {
        let due = self
            .last_update
            .map_or(true, |last| now.saturating_duration_since(last) > self.throttle);
        if due {
            self.frame = (self.frame + 1) % FRAMES.len();
            self.last_update = Some(now);
        }
    }

    pub fn frame(&self) -> &'static str {
        FRAMES[self.frame]
    }
}

impl Default for Spinner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Spinner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.frame())
    }
}
