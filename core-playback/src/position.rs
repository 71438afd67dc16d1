//! Position and seek control.
//!
//! The engine has no seek-while-paused command, so a seek is a scrub: the
//! rate is forced to 0 and the session is started at the target time. The
//! engine answers with `Started` (ignored while a seek is pending) and then
//! `ScrubSampleComplete`, which confirms the seek.
//!
//! Overlapping seeks coalesce: while one is pending only the newest target
//! is kept in the cached slot and dispatched when the pending one completes.

use bridge_traits::{media_time::Ticks, EventKind, StartPosition};
use tracing::{debug, warn};

use crate::error::{PlaybackError, Result};
use crate::session::{tolerate_timeout, SessionCore};
use crate::state::{Action, ActionKind, PlaybackState};

impl SessionCore {
    pub(crate) async fn set_media_position(&mut self, position: Ticks) -> Result<()> {
        if !self.check_seek(position)? {
            return Ok(());
        }
        if self.is_synchronous() {
            self.seek_sync(position).await
        } else {
            self.seek_async(position)
        }
    }

    /// Validates and dispatches an async-mode seek.
    pub(crate) fn request_seek(&mut self, position: Ticks) -> Result<()> {
        if self.check_seek(position)? {
            self.seek_async(position)?;
        }
        Ok(())
    }

    /// Returns `false` when the seek was deferred until the topology is
    /// ready, `true` when it should be dispatched now.
    fn check_seek(&mut self, position: Ticks) -> Result<bool> {
        self.engine()?;
        if !self.topology_ready {
            debug!(position, "media position deferred until topology is ready");
            self.deferred_position = Some(position);
            return Ok(false);
        }
        if self.state.is_closing_or_closed() {
            return Err(PlaybackError::invalid("seek", self.state));
        }

        let duration = self.duration();
        if !(0..=duration).contains(&position) {
            warn!(position, duration, "requested media position out of range");
            return Err(PlaybackError::PositionOutOfRange {
                requested: position,
                duration,
            });
        }
        Ok(true)
    }

    fn seek_async(&mut self, position: Ticks) -> Result<()> {
        if self.pending.is(ActionKind::SetMediaPosition) {
            self.fold_cached_rate();
            debug!(position, "seek cached behind pending seek");
            self.cached = Action::media_position(position);
            return Ok(());
        }
        // The seek replaces whatever is pending, so a rate queued behind it
        // would never be promoted.
        self.fold_cached_rate();

        let engine = self.engine()?;
        let control = self.rate_control();
        let previous = self.state;

        if previous == PlaybackState::Started {
            if let Err(err) = engine.pause() {
                warn!(error = %err, "pause before seek failed");
            }
            if let Some(control) = control.as_ref() {
                if let Err(err) = control.set_rate(false, 0.0) {
                    warn!(error = %err, "scrub rate rejected");
                }
            }
        } else if let Some(control) = control.as_ref() {
            let scrubbing = control.rate().map(|r| r.rate == 0.0).unwrap_or(false);
            if !scrubbing {
                if let Err(err) = control.set_rate(false, 0.0) {
                    warn!(error = %err, "scrub rate rejected");
                }
            }
        }

        self.set_state(PlaybackState::SeekingPosition);
        self.pending = Action::media_position(position);
        if let Err(err) = engine.start(StartPosition::At(position)) {
            warn!(error = %err, position, "seek dispatch failed");
            self.pending.clear();
            self.set_state(previous);
            return Err(err.into());
        }
        Ok(())
    }

    async fn seek_sync(&mut self, position: Ticks) -> Result<()> {
        let engine = self.engine()?;

        if self.state == PlaybackState::Started {
            let at = self.position();
            let dispatch = engine.clone();
            let result = self
                .dispatch_and_wait(Action::paused_at(at), EventKind::Paused, move || {
                    dispatch.pause()
                })
                .await;
            tolerate_timeout(result, "pause before seek")?;
        }

        if let Some(control) = self.rate_control() {
            let scrubbing = control.rate().map(|r| r.rate == 0.0).unwrap_or(false);
            if !scrubbing {
                let result = self
                    .dispatch_and_wait(Action::rate(0.0), EventKind::RateChanged, move || {
                        control.set_rate(false, 0.0)
                    })
                    .await;
                tolerate_timeout(result, "scrub rate")?;
            }
        }

        self.set_state(PlaybackState::SeekingPosition);
        self.dispatch_and_wait(
            Action::media_position(position),
            EventKind::ScrubSampleComplete,
            move || engine.start(StartPosition::At(position)),
        )
        .await
    }

    /// Dispatches a cached seek after the previous one completed. Skips the
    /// range and legality checks and the pre-pause and scrub-rate steps.
    pub(crate) fn apply_cached_position(&mut self, position: Ticks) {
        let Ok(engine) = self.engine() else {
            return;
        };
        self.set_state(PlaybackState::SeekingPosition);
        self.pending = Action::media_position(position);
        if let Err(err) = engine.start(StartPosition::At(position)) {
            warn!(error = %err, position, "cached seek dispatch failed");
            self.pending.clear();
            self.set_state(PlaybackState::Paused);
        } else {
            debug!(position, "cached seek dispatched");
        }
    }

    /// Moves a cached rate into the user rate, freeing the cached slot.
    fn fold_cached_rate(&mut self) {
        if self.cached.is(ActionKind::SetRate) {
            self.user_rate = self.cached.rate_value;
            self.cached.clear();
        }
    }

    /// Sets the stop position, clamped to the media. Any armed stop timer is
    /// cancelled; the new one is armed by the next start.
    pub(crate) fn set_stop_position(&mut self, position: Ticks) -> Result<()> {
        self.engine()?;
        let clamped = if self.topology_ready {
            position.clamp(0, self.duration())
        } else {
            position.max(0)
        };
        if !self.is_synchronous() {
            self.cancel_stop_timer();
        }
        debug!(requested = position, stop_time = clamped, "stop position set");
        self.stop_time = clamped;
        Ok(())
    }
}
