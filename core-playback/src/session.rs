//! # Session Core
//!
//! The state machine behind [`SessionController`](crate::SessionController).
//!
//! ## Overview
//!
//! `SessionCore` owns the authoritative [`PlaybackState`], the single
//! [`PendingAction`] and the single [`CachedAction`]. It is always accessed
//! under the controller's session lock; every method here assumes that lock
//! is held for the whole read-mutate-dispatch span.
//!
//! Transport methods come in two flavours selected by
//! [`ControlMode`](core_runtime::ControlMode):
//!
//! - async: dispatch to the engine, record the pending action, return. The
//!   confirmation is applied later by [`handle_message`](SessionCore::handle_message).
//! - sync: dispatch, then pump the engine's queue until the confirmation
//!   arrives (see `pump.rs`).
//!
//! The rate, position and timer logic lives in sibling modules as further
//! `impl SessionCore` blocks.

use std::sync::Arc;

use bridge_traits::{
    media_time::Ticks, EventKind, MediaEngine, RateControl, StartPosition,
};
use core_async::sync::watch;
use core_runtime::SessionConfig;
use tracing::{debug, info, warn};

use crate::error::{PlaybackError, Result};
use crate::services::{SessionServices, SharedServices};
use crate::state::{Action, ActionKind, CachedAction, PendingAction, PlaybackState};

pub(crate) struct SessionCore {
    pub(crate) config: SessionConfig,
    pub(crate) engine: Option<Arc<dyn MediaEngine>>,
    pub(crate) services: SharedServices,
    pub(crate) state: PlaybackState,
    state_tx: watch::Sender<PlaybackState>,
    pub(crate) pending: PendingAction,
    pub(crate) cached: CachedAction,
    /// Rate requested by the user; reapplied by start after a scrub.
    pub(crate) user_rate: f32,
    pub(crate) thin: bool,
    pub(crate) stop_time: Ticks,
    pub(crate) stop_timer: Option<bridge_traits::CancelKey>,
    pub(crate) end_timer: Option<bridge_traits::CancelKey>,
    pub(crate) topology_ready: bool,
    pub(crate) deferred_position: Option<Ticks>,
    pub(crate) deferred_volume: Option<f32>,
}

impl SessionCore {
    pub(crate) fn new(
        engine: Arc<dyn MediaEngine>,
        config: SessionConfig,
        services: SharedServices,
        state_tx: watch::Sender<PlaybackState>,
    ) -> Self {
        Self {
            config,
            engine: Some(engine),
            services,
            state: PlaybackState::NoSession,
            state_tx,
            pending: Action::NONE,
            cached: Action::NONE,
            user_rate: 1.0,
            thin: false,
            stop_time: 0,
            stop_timer: None,
            end_timer: None,
            topology_ready: false,
            deferred_position: None,
            deferred_volume: None,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub(crate) fn is_synchronous(&self) -> bool {
        self.config.is_synchronous()
    }

    pub(crate) fn set_state(&mut self, state: PlaybackState) {
        if self.state != state {
            debug!(from = %self.state, to = %state, "playback state changed");
            self.state = state;
            self.state_tx.send_replace(state);
        }
    }

    pub(crate) fn engine(&self) -> Result<Arc<dyn MediaEngine>> {
        self.engine.clone().ok_or(PlaybackError::NotInitialized)
    }

    pub(crate) fn rate_control(&self) -> Option<Arc<dyn RateControl>> {
        self.services.read().rate.clone()
    }

    pub(crate) fn position(&self) -> Ticks {
        self.services.read().position()
    }

    pub(crate) fn duration(&self) -> Ticks {
        self.services.read().duration
    }

    /// Started, or a start has been dispatched and not yet confirmed.
    pub(crate) fn is_playing(&self) -> bool {
        self.state == PlaybackState::Started || self.pending.is(ActionKind::SetStarted)
    }

    /// Engine handle for a transport command, rejecting sessions that are
    /// not ready or already closing.
    pub(crate) fn transport_engine(
        &self,
        operation: &'static str,
    ) -> Result<Arc<dyn MediaEngine>> {
        let engine = self.engine()?;
        match self.state {
            PlaybackState::NoSession => Err(PlaybackError::NotInitialized),
            state if state.is_closing_or_closed() => Err(PlaybackError::invalid(operation, state)),
            _ => Ok(engine),
        }
    }

    // ========================================================================
    // Topology
    // ========================================================================

    /// Applies a `TopologyStatus(Ready)` event. Services are acquired only
    /// the first time; later ready events just restore the `Ready` state.
    pub(crate) fn on_topology_ready(&mut self) {
        self.set_state(PlaybackState::Ready);

        if self.topology_ready {
            debug!("topology was already initialized");
            return;
        }
        let Some(engine) = self.engine.clone() else {
            return;
        };

        let mut services = SessionServices {
            clock: acquire("presentation clock", engine.presentation_clock()),
            rate: acquire("rate control", engine.rate_control()),
            volume: acquire("stream volume", engine.stream_volume()),
            time_per_frame: engine.time_per_frame(),
            ..Default::default()
        };
        // Timers only ever fire into the async event processor.
        if !self.is_synchronous() {
            services.timers = acquire("timer service", engine.timer_service());
        }
        services.duration = engine.duration().unwrap_or_else(|err| {
            warn!(error = %err, "could not read media duration");
            0
        });
        let duration = services.duration;
        *self.services.write() = services;
        self.topology_ready = true;
        info!(duration, "topology ready");

        if let Some(level) = self.deferred_volume.take() {
            if let Err(err) = self.set_volume(level) {
                warn!(error = %err, level, "could not apply initial volume");
            }
        }

        if !self.is_synchronous() {
            if let Some(position) = self.deferred_position.take() {
                if let Err(err) = self.request_seek(position) {
                    warn!(error = %err, position, "could not apply initial media position");
                }
            }
        }
    }

    // ========================================================================
    // Transport
    // ========================================================================

    pub(crate) async fn start(&mut self) -> Result<()> {
        let engine = self.transport_engine("start")?;
        if self.is_playing() {
            return Err(PlaybackError::invalid("start", self.state));
        }

        if self.is_synchronous() {
            self.restore_user_rate_sync().await?;
            let dispatch = engine.clone();
            return self
                .dispatch_and_wait(
                    Action::of(ActionKind::SetStarted),
                    EventKind::Started,
                    move || dispatch.start(StartPosition::Current),
                )
                .await;
        }

        self.restore_user_rate();
        engine.start(StartPosition::Current)?;
        self.pending = Action::of(ActionKind::SetStarted);
        self.arm_playback_timers();
        Ok(())
    }

    /// Brings the engine back to the user's rate after a scrub left it at 0.
    /// Neither step records a pending action; their confirmations fall
    /// through the event table unmatched.
    fn restore_user_rate(&mut self) {
        let Some(control) = self.rate_control() else {
            return;
        };
        let Some(current) = self.services.read().current_rate() else {
            return;
        };
        if current.rate == self.user_rate {
            return;
        }
        debug!(
            current = current.rate,
            user_rate = self.user_rate,
            "restoring user rate before start"
        );
        if !self.state.is_idle() {
            if let Ok(engine) = self.engine() {
                if let Err(err) = engine.pause() {
                    warn!(error = %err, "pause before rate restore failed");
                }
            }
        }
        if let Err(err) = control.set_rate(self.thin, self.user_rate) {
            warn!(error = %err, rate = self.user_rate, "could not restore user rate");
        }
    }

    async fn restore_user_rate_sync(&mut self) -> Result<()> {
        let Some(control) = self.rate_control() else {
            return Ok(());
        };
        let Some(current) = self.services.read().current_rate() else {
            return Ok(());
        };
        if current.rate == self.user_rate {
            return Ok(());
        }
        if !self.state.is_idle() {
            let engine = self.engine()?;
            let at = self.position();
            let result = self
                .dispatch_and_wait(Action::paused_at(at), EventKind::Paused, move || engine.pause())
                .await;
            tolerate_timeout(result, "pause before rate restore")?;
        }
        let (thin, rate) = (self.thin, self.user_rate);
        let result = self
            .dispatch_and_wait(Action::rate(rate), EventKind::RateChanged, move || {
                control.set_rate(thin, rate)
            })
            .await;
        tolerate_timeout(result, "rate restore")
    }

    pub(crate) async fn stop(&mut self) -> Result<()> {
        let engine = self.transport_engine("stop")?;
        if !matches!(self.state, PlaybackState::Started | PlaybackState::Paused) {
            return Err(PlaybackError::invalid("stop", self.state));
        }

        if self.is_synchronous() {
            return self
                .dispatch_and_wait(Action::of(ActionKind::SetStopped), EventKind::Stopped, move || {
                    engine.stop()
                })
                .await;
        }

        engine.stop()?;
        self.pending = Action::of(ActionKind::SetStopped);
        Ok(())
    }

    pub(crate) async fn pause(&mut self) -> Result<()> {
        if !self.is_synchronous() {
            return self.pause_async();
        }

        let engine = self.transport_engine("pause")?;
        if self.state != PlaybackState::Started {
            return Err(PlaybackError::invalid("pause", self.state));
        }
        let at = self.position();
        self.dispatch_and_wait(Action::paused_at(at), EventKind::Paused, move || engine.pause())
            .await
    }

    /// Dispatches a pause and records the position it was requested at.
    /// Also used by the stop and end timers.
    pub(crate) fn pause_async(&mut self) -> Result<()> {
        let engine = self.transport_engine("pause")?;
        if !self.is_playing() {
            return Err(PlaybackError::invalid("pause", self.state));
        }
        let at = self.position();
        engine.pause()?;
        self.pending = Action::paused_at(at);
        Ok(())
    }

    // ========================================================================
    // Close & Teardown
    // ========================================================================

    /// Stops a running session, then dispatches close with
    /// `Pending = SetClosed`. The caller waits for the confirmation and
    /// always finishes with [`teardown`](Self::teardown).
    pub(crate) async fn begin_close(&mut self) -> Result<()> {
        let engine = self.engine()?;
        if self.state.is_closing_or_closed() {
            return Err(PlaybackError::invalid("close", self.state));
        }

        self.cancel_playback_timers();
        if matches!(self.state, PlaybackState::Started | PlaybackState::Paused) {
            if let Err(err) = self.stop().await {
                warn!(error = %err, "stop before close failed");
            }
        }

        self.set_state(PlaybackState::Closing);
        self.cached.clear();
        self.pending = Action::of(ActionKind::SetClosed);
        engine.close()?;
        Ok(())
    }

    /// Releases the engine session and every service handle. Runs at most
    /// once; failures are logged and never stop the release.
    pub(crate) fn teardown(&mut self) {
        if self.engine.is_none() {
            return;
        }
        self.cancel_playback_timers();

        if let Some(engine) = self.engine.take() {
            if let Err(err) = engine.cancel_notify() {
                warn!(error = %err, "cancel notify failed during teardown");
            }
            if let Err(err) = engine.shutdown() {
                warn!(error = %err, "engine shutdown failed during teardown");
            }
        }

        *self.services.write() = SessionServices::default();
        self.pending.clear();
        self.cached.clear();
        self.set_state(PlaybackState::Closed);
        info!("engine session released");
    }

    // ========================================================================
    // Volume
    // ========================================================================

    /// Sets the stream volume, or remembers it until the topology is ready.
    pub(crate) fn set_volume(&mut self, level: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&level) {
            return Err(PlaybackError::InvalidVolume(level));
        }
        self.engine()?;

        let volume = self.services.read().volume.clone();
        match volume {
            Some(volume) => volume.set_volume(level)?,
            None => {
                debug!(level, "volume deferred until topology is ready");
                self.deferred_volume = Some(level);
            }
        }
        Ok(())
    }

    pub(crate) fn volume(&self) -> f32 {
        let volume = self.services.read().volume.clone();
        match volume {
            Some(volume) => volume.volume().unwrap_or_else(|err| {
                warn!(error = %err, "could not read volume");
                1.0
            }),
            None => self.deferred_volume.unwrap_or(1.0),
        }
    }
}

fn acquire<T: ?Sized>(
    name: &'static str,
    result: bridge_traits::error::Result<Arc<T>>,
) -> Option<Arc<T>> {
    match result {
        Ok(service) => Some(service),
        Err(err) => {
            warn!(service = name, error = %err, "session service unavailable");
            None
        }
    }
}

/// Intermediate steps of a synchronous command may time out without failing
/// the command; the final step decides.
pub(crate) fn tolerate_timeout(result: Result<()>, step: &'static str) -> Result<()> {
    match result {
        Err(err) if err.is_timeout() => {
            warn!(step, error = %err, "synchronous step timed out, continuing");
            Ok(())
        }
        other => other,
    }
}
