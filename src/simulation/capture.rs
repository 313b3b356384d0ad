//! Capture pacing, decoupled from the tick rate

use std::time::Duration;

/// Fires once every capture interval of accumulated tick time
#[derive(Debug, Clone)]
pub struct CaptureGate {
    interval: Option<f32>,
    elapsed: f32,
}

impl CaptureGate {
    /// `None` disables capture entirely
    pub fn new(interval: Option<Duration>) -> Self {
        Self {
            interval: interval.map(|i| i.as_secs_f32()),
            elapsed: 0.0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.interval.is_some()
    }

    /// Stop firing for good
    pub fn disable(&mut self) {
        self.interval = None;
        self.elapsed = 0.0;
    }

    /// Add `dt` seconds; true when a capture is due
    ///
    /// Overshoot is dropped rather than carried, so a long stall produces one
    /// capture, not a burst.
    pub fn advance(&mut self, dt: f32) -> bool {
        let Some(interval) = self.interval else {
            return false;
        };
        self.elapsed += dt;
        if self.elapsed >= interval {
            self.elapsed = 0.0;
            true
        } else {
            false
        }
    }
}
