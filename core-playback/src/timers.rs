//! Stop and end-of-media timers.
//!
//! Both timers are armed by an async-mode start against the presentation
//! clock. The stop timer pauses at the user's stop position; the end timer
//! pauses shortly before the media ends so the session never runs into the
//! engine's end-of-presentation teardown.

use bridge_traits::{CancelKey, EventStatus, TimerService, TimerToken};
use tracing::{debug, warn};

use crate::processor::ProcessOutcome;
use crate::session::SessionCore;

impl SessionCore {
    /// Re-arms the stop and end timers for a new start.
    pub(crate) fn arm_playback_timers(&mut self) {
        let timers = self.services.read().timers.clone();
        let Some(timers) = timers else {
            return;
        };
        self.cancel_playback_timers();

        if self.stop_time > 0 {
            self.stop_timer = arm(timers.as_ref(), self.stop_time, TimerToken::Stop);
        }
        let end_at = self.duration() - self.config.end_of_media_margin;
        if end_at > 0 {
            self.end_timer = arm(timers.as_ref(), end_at, TimerToken::End);
        }
    }

    pub(crate) fn cancel_stop_timer(&mut self) {
        if let Some(key) = self.stop_timer.take() {
            self.cancel_timer(key);
        }
    }

    pub(crate) fn cancel_playback_timers(&mut self) {
        self.cancel_stop_timer();
        if let Some(key) = self.end_timer.take() {
            self.cancel_timer(key);
        }
    }

    fn cancel_timer(&self, key: CancelKey) {
        let timers = self.services.read().timers.clone();
        if let Some(timers) = timers {
            if let Err(err) = timers.cancel(key) {
                warn!(error = %err, ?key, "timer cancel failed");
            }
        }
    }

    pub(crate) fn on_timer_fired(
        &mut self,
        token: TimerToken,
        status: EventStatus,
    ) -> ProcessOutcome {
        if !status.is_success() {
            debug!(?token, ?status, "timer completed without firing");
            return ProcessOutcome::Ignored;
        }

        match token {
            TimerToken::Stop => {
                self.stop_timer = None;
                let position = self.position();
                let distance = (self.stop_time - position).abs();
                if self.stop_time <= 0 || distance > self.config.stop_time_tolerance {
                    debug!(stop_time = self.stop_time, position, "stale stop timer");
                    return ProcessOutcome::Ignored;
                }
            }
            TimerToken::End => self.end_timer = None,
        }

        match self.pause_async() {
            Ok(()) => {
                debug!(?token, "timer paused playback");
                ProcessOutcome::Handled
            }
            Err(err) => {
                debug!(?token, error = %err, "timer pause skipped");
                ProcessOutcome::Ignored
            }
        }
    }
}

fn arm(
    timers: &dyn TimerService,
    at: bridge_traits::media_time::Ticks,
    token: TimerToken,
) -> Option<CancelKey> {
    match timers.arm(at, token) {
        Ok(key) => {
            debug!(?token, at, "timer armed");
            Some(key)
        }
        Err(err) => {
            warn!(?token, at, error = %err, "timer arm failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::media_time::Ticks;
    use mockall::{mock, predicate::eq};

    mock! {
        Timers {}

        impl TimerService for Timers {
            fn arm(&self, at: Ticks, token: TimerToken) -> BridgeResult<CancelKey>;
            fn cancel(&self, key: CancelKey) -> BridgeResult<()>;
        }
    }

    #[test]
    fn test_arm_returns_key() {
        let mut timers = MockTimers::new();
        timers
            .expect_arm()
            .with(eq(5_000_000), eq(TimerToken::Stop))
            .times(1)
            .returning(|_, _| Ok(CancelKey(7)));

        assert_eq!(arm(&timers, 5_000_000, TimerToken::Stop), Some(CancelKey(7)));
    }

    #[test]
    fn test_arm_failure_yields_no_key() {
        let mut timers = MockTimers::new();
        timers
            .expect_arm()
            .returning(|_, _| Err(bridge_traits::BridgeError::NotAvailable("timers".into())));

        assert_eq!(arm(&timers, 1, TimerToken::End), None);
    }
}
