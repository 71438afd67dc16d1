//! Synchronous pump.
//!
//! In synchronous mode a command does not return until its confirmation has
//! been observed. The pump polls the engine's event queue without blocking,
//! feeds every event through the same update step as the async processor,
//! and stops at the first event of the awaited kind. An empty poll sleeps for
//! `sync_poll_interval`; after `sync_event_budget` attempts the wait ends
//! with a soft [`PlaybackError::Timeout`].
//!
//! The session lock stays held for the whole wait, so a session driven this
//! way must have a single owning caller.

use bridge_traits::error::BridgeError;
use bridge_traits::{EventKind, EventStatus, SessionMessage};
use core_async::time::sleep;
use tracing::{debug, warn};

use crate::error::{PlaybackError, Result, WaitBudget};
use crate::session::SessionCore;
use crate::state::Action;

impl SessionCore {
    /// Records `action` as pending, runs `dispatch`, and pumps until the
    /// `awaited` event. The pending slot is cleared if dispatch fails or the
    /// wait runs out.
    pub(crate) async fn dispatch_and_wait<F>(
        &mut self,
        action: Action,
        awaited: EventKind,
        dispatch: F,
    ) -> Result<()>
    where
        F: FnOnce() -> bridge_traits::error::Result<()>,
    {
        self.pending = action;
        if let Err(err) = dispatch() {
            self.pending.clear();
            return Err(err.into());
        }

        let result = self.pump_until(awaited).await;
        if result.is_err() && self.pending == action {
            self.pending.clear();
        }
        result
    }

    /// Pumps the engine queue until an event of kind `awaited` has been
    /// applied. For `TopologyStatus` only the `Ready` status counts. An
    /// awaited event carrying a failed status ends the wait with
    /// [`PlaybackError::Engine`].
    pub(crate) async fn pump_until(&mut self, awaited: EventKind) -> Result<()> {
        let engine = self.engine()?;
        let budget = self.config.sync_event_budget;

        for attempt in 1..=budget {
            let message = match engine.try_next_event() {
                Ok(Some(message)) => message,
                Ok(None) => {
                    sleep(self.config.sync_poll_interval).await;
                    continue;
                }
                Err(err) => {
                    warn!(error = %err, ?awaited, "failed to fetch engine event");
                    return Err(err.into());
                }
            };

            let matched = satisfies(&message, awaited);
            let failure = failure_code(&message);
            self.handle_message(message);
            if matched {
                if let Some(code) = failure {
                    warn!(?awaited, code, "awaited event reported failure");
                    return Err(BridgeError::engine(code, format!("{awaited:?} failed")).into());
                }
                debug!(?awaited, attempt, "awaited event observed");
                return Ok(());
            }
        }

        warn!(?awaited, budget, "event wait exhausted its retry budget");
        Err(PlaybackError::Timeout {
            awaited,
            budget: WaitBudget::Attempts(budget),
        })
    }

    /// Pumps until the topology is ready, then applies a position requested
    /// before that point.
    pub(crate) async fn pump_until_ready(&mut self) -> Result<()> {
        if !self.topology_ready {
            self.pump_until(EventKind::TopologyStatus).await?;
        }
        if let Some(position) = self.deferred_position.take() {
            if let Err(err) = self.set_media_position(position).await {
                warn!(error = %err, position, "could not apply initial media position");
            }
        }
        Ok(())
    }
}

fn satisfies(message: &SessionMessage, awaited: EventKind) -> bool {
    match message {
        SessionMessage::Engine(event) if event.kind == awaited => {
            awaited != EventKind::TopologyStatus || event.is_topology_ready()
        }
        _ => false,
    }
}

fn failure_code(message: &SessionMessage) -> Option<i32> {
    match message {
        SessionMessage::Engine(event) => match event.status {
            EventStatus::Failed(code) => Some(code),
            _ => None,
        },
        _ => None,
    }
}
