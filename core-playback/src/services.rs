//! Session services acquired once the topology is ready.
//!
//! The services live behind a `parking_lot::RwLock` shared between the
//! controller and the session core, so position and rate queries never wait
//! for the session lock.

use std::sync::Arc;

use bridge_traits::{
    media_time::Ticks, PlaybackRate, PresentationClock, RateControl, StreamVolume, TimerService,
};
use parking_lot::RwLock;
use tracing::warn;

pub(crate) type SharedServices = Arc<RwLock<SessionServices>>;

/// Handles and media properties of a ready session. Everything is `None`
/// (or zero) until the topology is ready and again after teardown.
#[derive(Default, Clone)]
pub(crate) struct SessionServices {
    pub clock: Option<Arc<dyn PresentationClock>>,
    pub rate: Option<Arc<dyn RateControl>>,
    pub timers: Option<Arc<dyn TimerService>>,
    pub volume: Option<Arc<dyn StreamVolume>>,
    pub duration: Ticks,
    pub time_per_frame: Option<Ticks>,
}

impl SessionServices {
    /// Current presentation time, 0 without a clock.
    pub fn position(&self) -> Ticks {
        let Some(clock) = self.clock.as_ref() else {
            return 0;
        };
        match clock.time() {
            Ok(time) => time,
            Err(err) => {
                warn!(error = %err, "presentation clock unavailable");
                0
            }
        }
    }

    /// Rate reported by the engine, `None` without rate control.
    pub fn current_rate(&self) -> Option<PlaybackRate> {
        let control = self.rate.as_ref()?;
        match control.rate() {
            Ok(rate) => Some(rate),
            Err(err) => {
                warn!(error = %err, "could not read playback rate");
                None
            }
        }
    }
}

impl std::fmt::Debug for SessionServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionServices")
            .field("clock", &self.clock.is_some())
            .field("rate", &self.rate.is_some())
            .field("timers", &self.timers.is_some())
            .field("volume", &self.volume.is_some())
            .field("duration", &self.duration)
            .field("time_per_frame", &self.time_per_frame)
            .finish()
    }
}
