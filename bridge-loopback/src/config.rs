use std::time::Duration;

use bridge_traits::media_time::{Ticks, TICKS_PER_MILLISECOND, TICKS_PER_SECOND};
use serde::{Deserialize, Serialize};

/// Properties of the simulated media and engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopbackConfig {
    /// Media duration.
    pub duration: Ticks,
    /// Frame duration; `None` simulates audio-only media.
    pub time_per_frame: Option<Ticks>,
    /// Largest rate magnitude played without thinning.
    pub max_rate: f32,
    /// Largest rate magnitude played with thinning.
    pub max_thinned_rate: f32,
    /// Queue `TopologySet` and `TopologyStatus(Ready)` on construction.
    pub ready_on_open: bool,
    /// How often armed timers compare the clock with their deadline.
    pub timer_resolution: Duration,
}

impl Default for LoopbackConfig {
    fn default() -> Self {
        Self {
            duration: 60 * TICKS_PER_SECOND,
            // 25 fps
            time_per_frame: Some(40 * TICKS_PER_MILLISECOND),
            max_rate: 2.0,
            max_thinned_rate: 8.0,
            ready_on_open: true,
            timer_resolution: Duration::from_millis(5),
        }
    }
}

impl LoopbackConfig {
    pub fn with_duration(mut self, duration: Ticks) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_time_per_frame(mut self, time_per_frame: Option<Ticks>) -> Self {
        self.time_per_frame = time_per_frame;
        self
    }

    pub fn with_rate_limits(mut self, max_rate: f32, max_thinned_rate: f32) -> Self {
        self.max_rate = max_rate;
        self.max_thinned_rate = max_thinned_rate;
        self
    }

    pub fn with_ready_on_open(mut self, ready: bool) -> Self {
        self.ready_on_open = ready;
        self
    }
}
