//! # Media Player Façade
//!
//! Host-facing player over [`SessionController`].
//!
//! ## Overview
//!
//! [`MediaPlayer`] is what a binding layer or application talks to. It
//! speaks milliseconds instead of engine ticks, owns the event processor
//! task, and adds frame stepping on top of the controller's seek.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_loopback::LoopbackEngine;
//! use core_service::MediaPlayer;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let player = MediaPlayer::open(Arc::new(LoopbackEngine::default()), Default::default()).await?;
//! player.wait_until_ready(Duration::from_secs(1)).await?;
//! player.set_media_time(2_500.0).await?;
//! player.start().await?;
//! player.close().await?;
//! ```

pub mod error;

pub use error::{Result, ServiceError};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bridge_traits::media_time::{ticks_from_millis, ticks_to_millis, Ticks};
use bridge_traits::MediaEngine;
use core_async::task::JoinHandle;
use core_playback::{PlaybackState, SessionController};
use core_runtime::SessionConfig;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

/// Millisecond playback API over one engine session.
pub struct MediaPlayer {
    controller: SessionController,
    processor: Mutex<Option<JoinHandle<()>>>,
    stop_time_supported: AtomicBool,
}

impl MediaPlayer {
    /// Opens a player on `engine`. In async mode the event processor is
    /// spawned on the current runtime.
    pub async fn open(engine: Arc<dyn MediaEngine>, config: SessionConfig) -> Result<Self> {
        let controller = SessionController::new(engine, config)?;
        let processor = controller.spawn_event_processor();
        info!(
            mode = ?controller.config().mode,
            processor = processor.is_some(),
            "media player opened"
        );
        Ok(Self {
            controller,
            processor: Mutex::new(processor),
            stop_time_supported: AtomicBool::new(true),
        })
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    pub async fn wait_until_ready(&self, limit: Duration) -> Result<()> {
        self.controller.wait_until_ready(limit).await?;
        Ok(())
    }

    // ========================================================================
    // Transport
    // ========================================================================

    pub async fn start(&self) -> Result<()> {
        Ok(self.controller.start().await?)
    }

    pub async fn pause(&self) -> Result<()> {
        Ok(self.controller.pause().await?)
    }

    /// Halts playback, keeping the current position.
    pub async fn stop(&self) -> Result<()> {
        Ok(self.controller.pause().await?)
    }

    pub async fn is_playing(&self) -> bool {
        self.controller.is_playing().await
    }

    pub fn state(&self) -> PlaybackState {
        self.controller.state()
    }

    // ========================================================================
    // Time
    // ========================================================================

    pub async fn set_media_time(&self, millis: f64) -> Result<()> {
        Ok(self
            .controller
            .set_media_position(ticks_from_millis(millis))
            .await?)
    }

    pub fn media_time(&self) -> f64 {
        ticks_to_millis(self.controller.media_position())
    }

    pub fn duration(&self) -> f64 {
        ticks_to_millis(self.controller.duration())
    }

    /// Sets where playback pauses automatically; 0 clears it.
    pub async fn set_stop_time(&self, millis: f64) -> Result<()> {
        self.controller
            .set_stop_position(ticks_from_millis(millis))
            .await?;

        let ready = self.controller.state() != PlaybackState::NoSession;
        if ready && !self.controller.supports_stop_position() {
            if self.stop_time_supported.swap(false, Ordering::Relaxed) {
                warn!("session has no timer service, stop time will not take effect");
            }
        }
        Ok(())
    }

    pub async fn stop_time(&self) -> f64 {
        ticks_to_millis(self.controller.stop_position().await)
    }

    pub fn stop_time_supported(&self) -> bool {
        self.stop_time_supported.load(Ordering::Relaxed)
    }

    // ========================================================================
    // Rate & Volume
    // ========================================================================

    pub async fn set_rate(&self, rate: f32) -> Result<()> {
        Ok(self.controller.set_rate(rate).await?)
    }

    pub fn rate(&self) -> f32 {
        self.controller.rate()
    }

    pub async fn set_volume(&self, level: f32) -> Result<()> {
        Ok(self.controller.set_volume(level).await?)
    }

    pub async fn volume(&self) -> f32 {
        self.controller.volume().await
    }

    // ========================================================================
    // Frames
    // ========================================================================

    /// Frame duration in milliseconds.
    pub fn time_per_frame(&self) -> Option<f64> {
        self.controller.time_per_frame().map(ticks_to_millis)
    }

    /// Frames per second.
    pub fn frame_rate(&self) -> Option<f64> {
        self.time_per_frame()
            .filter(|millis| *millis > 0.0)
            .map(|millis| 1_000.0 / millis)
    }

    /// Seeks one frame forward and returns the new media time.
    pub async fn next_frame(&self, at_frame_begin: bool) -> Result<f64> {
        let frame = self.frame_ticks()?;
        let target = next_frame_target(self.controller.media_position(), frame, at_frame_begin)
            .min(self.controller.duration());
        self.step_to(target).await
    }

    /// Seeks one frame back and returns the new media time.
    pub async fn previous_frame(&self, at_frame_begin: bool) -> Result<f64> {
        let frame = self.frame_ticks()?;
        let target = previous_frame_target(self.controller.media_position(), frame, at_frame_begin);
        self.step_to(target).await
    }

    fn frame_ticks(&self) -> Result<Ticks> {
        self.controller
            .time_per_frame()
            .filter(|frame| *frame > 0)
            .ok_or(ServiceError::NoFrameTiming)
    }

    async fn step_to(&self, target: Ticks) -> Result<f64> {
        debug!(target, "frame step");
        self.controller.set_media_position(target).await?;
        Ok(ticks_to_millis(target))
    }

    // ========================================================================
    // Close
    // ========================================================================

    /// Closes the session. The engine is released even when the close is
    /// not confirmed in time.
    pub async fn close(&self) -> Result<()> {
        let result = self.controller.close().await;
        if let Some(processor) = self.processor.lock().take() {
            if !processor.is_finished() {
                debug!("event processor still draining after close");
            }
        }
        Ok(result?)
    }
}

fn next_frame_target(position: Ticks, frame: Ticks, at_frame_begin: bool) -> Ticks {
    if at_frame_begin {
        (position.div_euclid(frame) + 1) * frame
    } else {
        position + frame
    }
}

/// With `at_frame_begin`, the latest frame start strictly before `position`.
fn previous_frame_target(position: Ticks, frame: Ticks, at_frame_begin: bool) -> Ticks {
    let target = if at_frame_begin {
        let index = (position + frame - 1).div_euclid(frame) - 1;
        index * frame
    } else {
        position - frame
    };
    target.max(0)
}
