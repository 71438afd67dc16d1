//! Virtual presentation clock.

use std::time::Instant;

use bridge_traits::media_time::{ticks_from_duration, Ticks};

/// Presentation time that advances with wall time scaled by the rate while
/// running, clamped to `[0, end]`.
#[derive(Debug, Clone)]
pub(crate) struct VirtualClock {
    base: Ticks,
    anchor: Option<Instant>,
    rate: f32,
    end: Ticks,
}

impl VirtualClock {
    pub(crate) fn new(end: Ticks) -> Self {
        Self {
            base: 0,
            anchor: None,
            rate: 1.0,
            end,
        }
    }

    pub(crate) fn now(&self) -> Ticks {
        let Some(anchor) = self.anchor else {
            return self.base;
        };
        let elapsed = ticks_from_duration(anchor.elapsed()) as f64;
        let advanced = self.base as f64 + elapsed * self.rate as f64;
        (advanced.round() as Ticks).clamp(0, self.end)
    }

    pub(crate) fn is_running(&self) -> bool {
        self.anchor.is_some()
    }

    pub(crate) fn rate(&self) -> f32 {
        self.rate
    }

    pub(crate) fn run(&mut self) {
        if self.anchor.is_none() {
            self.anchor = Some(Instant::now());
        }
    }

    pub(crate) fn freeze(&mut self) {
        self.base = self.now();
        self.anchor = None;
    }

    pub(crate) fn seek(&mut self, position: Ticks) {
        self.base = position.clamp(0, self.end);
        if self.anchor.is_some() {
            self.anchor = Some(Instant::now());
        }
    }

    /// Changes the rate without moving the current presentation time.
    pub(crate) fn set_rate(&mut self, rate: f32) {
        let running = self.is_running();
        self.freeze();
        self.rate = rate;
        if running {
            self.run();
        }
    }
}
