//! Rate control.
//!
//! A rate request is resolved against the engine's support before dispatch:
//! the exact rate, then the exact rate with thinning, then the nearest rate
//! the engine reports (with thinning). Unsupported rates therefore never
//! surface as errors.
//!
//! While any request is pending, a new rate is coalesced into the cached
//! slot (last request wins) and dispatched once the pending request is
//! confirmed.

use std::sync::Arc;

use bridge_traits::{EventKind, MediaEngine, RateControl, RateSupport};
use tracing::{debug, warn};

use crate::error::{PlaybackError, Result};
use crate::session::{tolerate_timeout, SessionCore};
use crate::state::{Action, ActionKind};

/// Returns `(thin, rate)` to dispatch for `requested`.
pub(crate) fn resolve_rate(control: &dyn RateControl, requested: f32) -> (bool, f32) {
    if control.is_rate_supported(false, requested).is_supported() {
        return (false, requested);
    }
    match control.is_rate_supported(true, requested) {
        RateSupport::Supported => (true, requested),
        RateSupport::Unsupported { nearest } => {
            debug!(requested, nearest, "rate unsupported, falling back to nearest");
            (true, nearest)
        }
    }
}

impl SessionCore {
    pub(crate) async fn set_rate(&mut self, rate: f32) -> Result<()> {
        if !rate.is_finite() {
            return Err(PlaybackError::InvalidRate(rate));
        }
        let engine = self.transport_engine("set rate")?;
        let control = self.rate_control().ok_or(PlaybackError::NotInitialized)?;

        if !self.is_synchronous() && !self.pending.is_none() {
            self.coalesce_rate(rate);
            return Ok(());
        }

        let current = self.services.read().current_rate();
        if let Some(current) = current {
            if current.rate == rate {
                debug!(rate, "rate unchanged");
                return Ok(());
            }
        }

        if self.is_synchronous() {
            self.set_rate_sync(engine, control, rate).await
        } else {
            self.set_rate_async(engine, control, rate)
        }
    }

    /// Queues `rate` behind the pending request.
    fn coalesce_rate(&mut self, rate: f32) {
        if self.pending.is(ActionKind::SetRate) && self.pending.rate_value == rate {
            if self.cached.is(ActionKind::SetRate) {
                self.cached.clear();
            }
            debug!(rate, "rate already pending");
            return;
        }

        if self.cached.is_none() || self.cached.is(ActionKind::SetRate) {
            debug!(rate, pending = ?self.pending.kind, "rate request cached");
            self.cached = Action::rate(rate);
        } else {
            // The cached slot holds a seek; start reapplies the user rate.
            debug!(rate, "seek already cached, rate applied on next start");
            self.user_rate = rate;
        }
    }

    fn set_rate_async(
        &mut self,
        engine: Arc<dyn MediaEngine>,
        control: Arc<dyn RateControl>,
        rate: f32,
    ) -> Result<()> {
        let (thin, resolved) = resolve_rate(control.as_ref(), rate);

        if !self.state.is_idle() {
            if let Err(err) = engine.pause() {
                warn!(error = %err, "pause before rate change failed");
            }
        }

        control.set_rate(thin, resolved).map_err(|err| {
            warn!(error = %err, rate = resolved, thin, "set rate failed");
            err
        })?;
        self.user_rate = resolved;
        self.thin = thin;
        self.pending = Action::rate(resolved);
        Ok(())
    }

    async fn set_rate_sync(
        &mut self,
        engine: Arc<dyn MediaEngine>,
        control: Arc<dyn RateControl>,
        rate: f32,
    ) -> Result<()> {
        let (thin, resolved) = resolve_rate(control.as_ref(), rate);

        if !self.state.is_idle() {
            let at = self.position();
            let result = self
                .dispatch_and_wait(Action::paused_at(at), EventKind::Paused, move || engine.pause())
                .await;
            tolerate_timeout(result, "pause before rate change")?;
        }

        self.user_rate = resolved;
        self.thin = thin;
        self.dispatch_and_wait(Action::rate(resolved), EventKind::RateChanged, move || {
            control.set_rate(thin, resolved)
        })
        .await
    }

    /// Dispatches a cached rate after the previous request was confirmed.
    /// Skips the state checks and the pre-pause of a fresh request.
    pub(crate) fn apply_cached_rate(&mut self, rate: f32) {
        let Some(control) = self.rate_control() else {
            warn!(rate, "cached rate dropped, no rate control");
            return;
        };
        let (thin, resolved) = resolve_rate(control.as_ref(), rate);
        match control.set_rate(thin, resolved) {
            Ok(()) => {
                debug!(rate = resolved, thin, "cached rate dispatched");
                self.user_rate = resolved;
                self.thin = thin;
                self.pending = Action::rate(resolved);
            }
            Err(err) => warn!(error = %err, rate = resolved, "cached rate dispatch failed"),
        }
    }
}
