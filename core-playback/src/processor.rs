//! # Event Processor
//!
//! Applies engine confirmations to the session state.
//!
//! [`SessionCore::handle_message`] is the single update step. The async
//! [`EventProcessor`] calls it for every message received from the engine;
//! the synchronous pump calls it for every event it polls. Each call runs
//! under the session lock, so an event is applied atomically with respect to
//! user commands.
//!
//! An event confirms the pending action only when the kinds match (see
//! [`ActionKind::confirmed_by`]). Confirmation clears the pending slot and
//! promotes the cached action, if any, to a fresh dispatch.

use std::sync::Arc;

use bridge_traits::{EngineEvent, EventKind, EventStatus, SessionMessage};
use core_async::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::session::SessionCore;
use crate::state::{ActionKind, PlaybackState};

/// What [`SessionCore::handle_message`] did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The message changed the session.
    Handled,
    /// The message was recognised but had no effect.
    Ignored,
    /// The session is closing, closed or released; the message was dropped.
    Unexpected,
    /// The `Closed` confirmation was applied. No further messages follow.
    Closed,
}

impl SessionCore {
    pub(crate) fn handle_message(&mut self, message: SessionMessage) -> ProcessOutcome {
        if self.engine.is_none() || self.state == PlaybackState::Closed {
            debug!(?message, "message after session release dropped");
            return ProcessOutcome::Unexpected;
        }
        if self.state == PlaybackState::Closing && !self.confirms_close(&message) {
            debug!(?message, "message while closing dropped");
            return ProcessOutcome::Unexpected;
        }
        if self.config.debug {
            debug!(
                ?message,
                state = %self.state,
                pending = ?self.pending,
                cached = ?self.cached,
                "processing session message"
            );
        }

        match message {
            SessionMessage::TimerFired { token, status } => self.on_timer_fired(token, status),
            SessionMessage::Engine(event) => self.apply_event(event),
        }
    }

    /// Only the `Closed` confirmation may still change a closing session.
    fn confirms_close(&self, message: &SessionMessage) -> bool {
        self.pending.kind == ActionKind::SetClosed
            && matches!(message, SessionMessage::Engine(event) if event.kind == EventKind::Closed)
    }

    fn apply_event(&mut self, event: EngineEvent) -> ProcessOutcome {
        if event.status == EventStatus::Unavailable {
            warn!(kind = ?event.kind, "event status unavailable, event skipped");
            return ProcessOutcome::Ignored;
        }
        if let EventStatus::Failed(code) = event.status {
            return self.apply_failure(event.kind, code);
        }

        let pending = self.pending.kind;
        match event.kind {
            EventKind::TopologyStatus if event.is_topology_ready() => {
                self.on_topology_ready();
                ProcessOutcome::Handled
            }
            EventKind::Started if pending == ActionKind::SetStarted => {
                self.pending.clear();
                self.cached.clear();
                self.set_state(PlaybackState::Started);
                ProcessOutcome::Handled
            }
            EventKind::Paused if pending == ActionKind::SetPaused => {
                let at = self.pending.time_value;
                self.pending.clear();
                self.set_state(PlaybackState::Paused);
                if self.config.correct_at_pause && !self.is_synchronous() && at > 0 {
                    debug!(position = at, "correcting position after pause");
                    if let Err(err) = self.request_seek(at) {
                        warn!(error = %err, position = at, "pause correction failed");
                    }
                } else {
                    self.promote_cached();
                }
                ProcessOutcome::Handled
            }
            EventKind::Stopped if pending == ActionKind::SetStopped => {
                self.pending.clear();
                self.set_state(PlaybackState::Stopped);
                self.promote_cached();
                ProcessOutcome::Handled
            }
            EventKind::RateChanged if pending == ActionKind::SetRate => {
                self.pending.clear();
                self.promote_cached();
                ProcessOutcome::Handled
            }
            EventKind::ScrubSampleComplete if pending == ActionKind::SetMediaPosition => {
                self.pending.clear();
                if self.cached.is(ActionKind::SetMediaPosition) {
                    let position = self.cached.time_value;
                    self.cached.clear();
                    self.apply_cached_position(position);
                } else {
                    self.set_state(PlaybackState::Paused);
                    self.promote_cached();
                }
                ProcessOutcome::Handled
            }
            EventKind::EndOfPresentation | EventKind::Ended => {
                debug!(kind = ?event.kind, "end of media");
                self.set_state(PlaybackState::Paused);
                ProcessOutcome::Handled
            }
            EventKind::Closed if pending == ActionKind::SetClosed => {
                self.pending.clear();
                self.set_state(PlaybackState::Closed);
                info!("session close confirmed");
                ProcessOutcome::Closed
            }
            kind => {
                debug!(?kind, ?pending, "event does not confirm the pending action");
                ProcessOutcome::Ignored
            }
        }
    }

    /// A failed event confirms the pending action without the state change
    /// it would have made. The cached action is still dispatched.
    fn apply_failure(&mut self, kind: EventKind, code: i32) -> ProcessOutcome {
        let pending = self.pending.kind;
        match kind {
            EventKind::TopologySet => {
                warn!(code, "engine failed to set the topology");
                return ProcessOutcome::Ignored;
            }
            EventKind::RateChanged if pending == ActionKind::SetRate => {
                warn!(code, rate = self.pending.rate_value, "engine rejected rate change");
            }
            _ => {}
        }

        let confirms = pending.confirmed_by() == Some(kind);
        let seek_start = kind == EventKind::Started && pending == ActionKind::SetMediaPosition;
        if !confirms && !seek_start {
            debug!(?kind, code, ?pending, "unrelated failure event");
            return ProcessOutcome::Ignored;
        }

        warn!(?kind, code, ?pending, "engine reported failure for pending action");
        self.pending.clear();
        let seek_cached = self.cached.is(ActionKind::SetMediaPosition);
        if pending == ActionKind::SetMediaPosition && !seek_cached {
            self.set_state(PlaybackState::Paused);
        }
        self.promote_cached();
        ProcessOutcome::Handled
    }

    /// Dispatches the cached action after the pending slot was cleared.
    pub(crate) fn promote_cached(&mut self) {
        let cached = self.cached;
        self.cached.clear();
        match cached.kind {
            ActionKind::SetRate => self.apply_cached_rate(cached.rate_value),
            ActionKind::SetMediaPosition => self.apply_cached_position(cached.time_value),
            _ => {}
        }
    }
}

/// Drives a session in async mode: receives engine messages and applies
/// them under the session lock until the session closes or the engine drops
/// its sender.
pub struct EventProcessor {
    core: Arc<Mutex<SessionCore>>,
    receiver: mpsc::UnboundedReceiver<SessionMessage>,
}

impl EventProcessor {
    pub(crate) fn new(
        core: Arc<Mutex<SessionCore>>,
        receiver: mpsc::UnboundedReceiver<SessionMessage>,
    ) -> Self {
        Self { core, receiver }
    }

    pub async fn run(mut self) {
        info!("event processor started");
        while let Some(message) = self.receiver.recv().await {
            let outcome = self.core.lock().await.handle_message(message);
            if outcome == ProcessOutcome::Closed {
                break;
            }
        }
        info!("event processor stopped");
    }
}
