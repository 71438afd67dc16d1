//! # Session Controller
//!
//! Public entry point for controlling one engine session.
//!
//! ## Overview
//!
//! The controller serializes every command and every engine event through a
//! single session lock. Commands validate the current state, dispatch to the
//! engine, and record what they are waiting for; confirmations arrive later
//! and are applied by the [`EventProcessor`] (async mode) or by the command
//! itself through the synchronous pump.
//!
//! ## Usage
//!
//! ```ignore
//! let controller = SessionController::new(engine, SessionConfig::default())?;
//! controller.spawn_event_processor();
//! controller.wait_until_ready(Duration::from_secs(1)).await?;
//!
//! controller.set_rate(2.0).await?;
//! controller.start().await?;
//! controller.close().await?;
//! ```
//!
//! ## Thread Safety
//!
//! `SessionController` is `Send + Sync`. Position, rate and state reads do
//! not take the session lock and never wait behind a synchronous pump.

use std::sync::Arc;
use std::time::Duration;

use bridge_traits::{media_time::Ticks, EventKind, MediaEngine, SessionMessage};
use core_async::sync::{mpsc, watch, Mutex};
use core_async::task::JoinHandle;
use core_async::time::timeout;
use core_runtime::SessionConfig;
use parking_lot::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::error::{PlaybackError, Result, WaitBudget};
use crate::processor::{EventProcessor, ProcessOutcome};
use crate::services::{SessionServices, SharedServices};
use crate::session::SessionCore;
use crate::state::PlaybackState;

/// Controls playback of one engine session.
pub struct SessionController {
    core: Arc<Mutex<SessionCore>>,
    services: SharedServices,
    state_rx: watch::Receiver<PlaybackState>,
    config: SessionConfig,
    processor: parking_lot::Mutex<Option<EventProcessor>>,
}

impl SessionController {
    /// Wraps `engine` in a new controller.
    ///
    /// In async mode the engine is switched to push delivery immediately; the
    /// returned controller holds an [`EventProcessor`] that must be spawned
    /// (or driven) for any confirmation to be applied. In synchronous mode
    /// events stay queued in the engine until a command pumps them.
    pub fn new(engine: Arc<dyn MediaEngine>, config: SessionConfig) -> Result<Self> {
        config.validate()?;

        let services: SharedServices = Arc::new(RwLock::new(SessionServices::default()));
        let (state_tx, state_rx) = watch::channel(PlaybackState::NoSession);
        let core = Arc::new(Mutex::new(SessionCore::new(
            engine.clone(),
            config.clone(),
            services.clone(),
            state_tx,
        )));

        let processor = if config.is_synchronous() {
            None
        } else {
            let (tx, rx) = mpsc::unbounded_channel();
            engine.begin_notify(tx)?;
            Some(EventProcessor::new(core.clone(), rx))
        };

        info!(mode = ?config.mode, "session controller created");
        Ok(Self {
            core,
            services,
            state_rx,
            config,
            processor: parking_lot::Mutex::new(processor),
        })
    }

    // ========================================================================
    // Event Processing
    // ========================================================================

    /// Takes the event processor so the host can drive it on its own
    /// executor. `None` in synchronous mode or once taken.
    pub fn take_event_processor(&self) -> Option<EventProcessor> {
        self.processor.lock().take()
    }

    /// Spawns the event processor on the core runtime.
    pub fn spawn_event_processor(&self) -> Option<JoinHandle<()>> {
        self.take_event_processor()
            .map(|processor| core_async::spawn(processor.run()))
    }

    /// Applies one message under the session lock. Used by hosts that
    /// deliver events themselves instead of running the processor.
    pub async fn handle_message(&self, message: SessionMessage) -> ProcessOutcome {
        self.core.lock().await.handle_message(message)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Last confirmed state. A start that has not been confirmed yet is not
    /// reflected here; see [`is_playing`](Self::is_playing).
    pub fn state(&self) -> PlaybackState {
        *self.state_rx.borrow()
    }

    /// Receiver that observes every state change.
    pub fn subscribe_state(&self) -> watch::Receiver<PlaybackState> {
        self.state_rx.clone()
    }

    /// Current presentation time in ticks, 0 before the topology is ready.
    pub fn media_position(&self) -> Ticks {
        self.services.read().position()
    }

    /// Rate reported by the engine, 1.0 without rate control.
    pub fn rate(&self) -> f32 {
        self.services
            .read()
            .current_rate()
            .map(|rate| rate.rate)
            .unwrap_or(1.0)
    }

    pub fn duration(&self) -> Ticks {
        self.services.read().duration
    }

    pub fn time_per_frame(&self) -> Option<Ticks> {
        self.services.read().time_per_frame
    }

    /// Whether a stop position can take effect. Stop positions are enforced
    /// by engine timers, which only an async-mode session acquires.
    pub fn supports_stop_position(&self) -> bool {
        self.services.read().timers.is_some()
    }

    /// True when started or when a start is awaiting confirmation.
    pub async fn is_playing(&self) -> bool {
        self.core.lock().await.is_playing()
    }

    /// The rate the user asked for; reapplied by the next start.
    pub async fn user_rate(&self) -> f32 {
        self.core.lock().await.user_rate
    }

    pub async fn stop_position(&self) -> Ticks {
        self.core.lock().await.stop_time
    }

    pub async fn volume(&self) -> f32 {
        self.core.lock().await.volume()
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Waits until the engine reports its topology ready, then applies a
    /// media position requested before that point.
    #[instrument(skip(self))]
    pub async fn wait_until_ready(&self, limit: Duration) -> Result<()> {
        if self.config.is_synchronous() {
            return self.core.lock().await.pump_until_ready().await;
        }

        let mut state_rx = self.state_rx.clone();
        let ready = matches!(
            timeout(limit, state_rx.wait_for(|state| *state != PlaybackState::NoSession)).await,
            Ok(Ok(_))
        );
        if ready {
            debug!("session ready");
            Ok(())
        } else {
            Err(PlaybackError::Timeout {
                awaited: EventKind::TopologyStatus,
                budget: WaitBudget::Elapsed(limit),
            })
        }
    }

    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<()> {
        self.core.lock().await.start().await
    }

    #[instrument(skip(self))]
    pub async fn pause(&self) -> Result<()> {
        self.core.lock().await.pause().await
    }

    #[instrument(skip(self))]
    pub async fn stop(&self) -> Result<()> {
        self.core.lock().await.stop().await
    }

    /// Requests a playback rate. Unsupported rates fall back to the nearest
    /// rate the engine supports.
    #[instrument(skip(self))]
    pub async fn set_rate(&self, rate: f32) -> Result<()> {
        self.core.lock().await.set_rate(rate).await
    }

    /// Seeks to `position`. Before the topology is ready the position is
    /// remembered and applied once it is.
    #[instrument(skip(self))]
    pub async fn set_media_position(&self, position: Ticks) -> Result<()> {
        self.core.lock().await.set_media_position(position).await
    }

    /// Sets where playback pauses automatically. Takes effect at the next
    /// start; 0 disables it.
    #[instrument(skip(self))]
    pub async fn set_stop_position(&self, position: Ticks) -> Result<()> {
        self.core.lock().await.set_stop_position(position)
    }

    #[instrument(skip(self))]
    pub async fn set_volume(&self, level: f32) -> Result<()> {
        self.core.lock().await.set_volume(level)
    }

    /// Closes the session and releases the engine.
    ///
    /// The engine is released even when the `Closed` confirmation never
    /// arrives; the caller then gets [`PlaybackError::Timeout`].
    #[instrument(skip(self))]
    pub async fn close(&self) -> Result<()> {
        if self.config.is_synchronous() {
            return self.close_sync().await;
        }

        let begun = self.core.lock().await.begin_close().await;
        match begun {
            Ok(()) => {}
            Err(err @ PlaybackError::Engine(_)) => {
                warn!(error = %err, "close dispatch failed, releasing session");
                self.core.lock().await.teardown();
                return Err(err);
            }
            Err(err) => return Err(err),
        }

        let limit = self.config.close_timeout;
        let mut state_rx = self.state_rx.clone();
        let confirmed = matches!(
            timeout(limit, state_rx.wait_for(|state| *state == PlaybackState::Closed)).await,
            Ok(Ok(_))
        );

        self.core.lock().await.teardown();
        if confirmed {
            info!("session closed");
            Ok(())
        } else {
            warn!(?limit, "close was not confirmed in time");
            Err(PlaybackError::Timeout {
                awaited: EventKind::Closed,
                budget: WaitBudget::Elapsed(limit),
            })
        }
    }

    async fn close_sync(&self) -> Result<()> {
        let mut core = self.core.lock().await;
        match core.begin_close().await {
            Ok(()) => {}
            Err(err @ PlaybackError::Engine(_)) => {
                warn!(error = %err, "close dispatch failed, releasing session");
                core.teardown();
                return Err(err);
            }
            Err(err) => return Err(err),
        }

        let confirmed = core.pump_until(EventKind::Closed).await;
        core.teardown();
        confirmed
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        match self.core.try_lock() {
            Ok(mut core) => core.teardown(),
            Err(_) => warn!("session busy at drop, engine release skipped"),
        }
    }
}
