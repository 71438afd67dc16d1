//! Engine session and its per-session services.
//!
//! The core receives one [`MediaEngine`] per media source. Transport commands
//! are fire-and-confirm: a successful return only means the engine accepted
//! the command. Services (clock, rate control, timers, volume) become
//! available once the engine reports its topology as ready.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    error::Result, event::EventSource, media_time::Ticks, platform::PlatformSendSync,
    timer::TimerService,
};

/// Where a start command begins presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartPosition {
    /// Resume from the current presentation time.
    Current,
    /// Start (or scrub, at rate 0) at an absolute presentation time.
    At(Ticks),
}

/// Rate reported by the engine's rate control.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackRate {
    /// Whether frame thinning is enabled.
    pub thin: bool,
    pub rate: f32,
}

impl PlaybackRate {
    pub fn new(thin: bool, rate: f32) -> Self {
        Self { thin, rate }
    }
}

impl Default for PlaybackRate {
    fn default() -> Self {
        Self::new(false, 1.0)
    }
}

/// Result of probing whether a rate can be played.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RateSupport {
    Supported,
    /// The rate is not supported; `nearest` is the closest rate that is.
    Unsupported { nearest: f32 },
}

impl RateSupport {
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Supported)
    }
}

/// Presentation clock of a running session.
pub trait PresentationClock: PlatformSendSync {
    /// Current presentation time.
    fn time(&self) -> Result<Ticks>;
}

/// Playback rate control and rate support probing.
pub trait RateControl: PlatformSendSync {
    /// Current rate and thinning flag.
    fn rate(&self) -> Result<PlaybackRate>;

    /// Dispatches a rate change; confirmed later by a `RateChanged` event.
    fn set_rate(&self, thin: bool, rate: f32) -> Result<()>;

    /// Probes whether `rate` is playable with the given thinning mode.
    fn is_rate_supported(&self, _thin: bool, _rate: f32) -> RateSupport {
        RateSupport::Supported
    }
}

/// Audio stream volume, applied to every channel.
pub trait StreamVolume: PlatformSendSync {
    /// Volume level in `[0.0, 1.0]`.
    fn volume(&self) -> Result<f32>;

    fn set_volume(&self, level: f32) -> Result<()>;
}

/// Transport commands of a platform media session.
///
/// Implementations must not block: each command is dispatched and confirmed
/// later through the session's [`EventSource`].
pub trait EngineSession: PlatformSendSync {
    fn start(&self, position: StartPosition) -> Result<()>;

    fn pause(&self) -> Result<()>;

    fn stop(&self) -> Result<()>;

    /// Requests session close; confirmed by a `Closed` event.
    fn close(&self) -> Result<()>;

    /// Releases the source and session. Called once during teardown, after
    /// which no further events are delivered.
    fn shutdown(&self) -> Result<()>;

    /// Media duration reported by the source.
    fn duration(&self) -> Result<Ticks>;

    /// Average duration of one video frame, when the media has video.
    fn time_per_frame(&self) -> Option<Ticks> {
        None
    }

    fn presentation_clock(&self) -> Result<Arc<dyn PresentationClock>>;

    fn rate_control(&self) -> Result<Arc<dyn RateControl>>;

    fn timer_service(&self) -> Result<Arc<dyn TimerService>>;

    fn stream_volume(&self) -> Result<Arc<dyn StreamVolume>>;
}

/// A session together with its event source, as consumed by the core.
pub trait MediaEngine: EngineSession + EventSource {}

impl<T> MediaEngine for T where T: EngineSession + EventSource + ?Sized {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;
    use mockall::mock;

    mock! {
        Rate {}

        impl RateControl for Rate {
            fn rate(&self) -> Result<PlaybackRate>;
            fn set_rate(&self, thin: bool, rate: f32) -> Result<()>;
            fn is_rate_supported(&self, thin: bool, rate: f32) -> RateSupport;
        }
    }

    #[test]
    fn test_rate_control_as_trait_object() {
        let mut mock = MockRate::new();
        mock.expect_rate()
            .returning(|| Ok(PlaybackRate::new(true, 4.0)));
        mock.expect_set_rate()
            .withf(|thin, rate| !*thin && *rate == 0.0)
            .times(1)
            .returning(|_, _| Err(BridgeError::engine(-1, "rejected")));

        let control: Arc<dyn RateControl> = Arc::new(mock);
        assert_eq!(control.rate().unwrap(), PlaybackRate::new(true, 4.0));
        let err = control.set_rate(false, 0.0).unwrap_err();
        assert_eq!(err.code(), Some(-1));
    }

    #[test]
    fn test_rate_support_helpers() {
        assert!(RateSupport::Supported.is_supported());
        assert!(!RateSupport::Unsupported { nearest: 2.0 }.is_supported());
        assert_eq!(PlaybackRate::default(), PlaybackRate::new(false, 1.0));
    }
}
