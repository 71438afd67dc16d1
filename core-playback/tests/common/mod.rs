//! Scripted engine for controller tests.
//!
//! Records every call and never confirms anything by itself; tests feed
//! confirmations through `SessionController::handle_message`.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;

use bridge_traits::{
    error::{BridgeError, Result},
    media_time::{Ticks, TICKS_PER_SECOND},
    CancelKey, EngineEvent, EngineSession, EventKind, EventSender, EventSource, PlaybackRate,
    PresentationClock, RateControl, RateSupport, SessionMessage, StartPosition, StreamVolume,
    TimerService, TimerToken, TopologyStatus,
};
use core_playback::{PlaybackState, SessionController};
use core_runtime::SessionConfig;
use parking_lot::Mutex;

pub const DURATION: Ticks = 100 * TICKS_PER_SECOND;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Start(StartPosition),
    Pause,
    Stop,
    Close,
    Shutdown,
    SetRate(bool, f32),
    Arm(Ticks, TimerToken),
    Cancel(CancelKey),
    SetVolume(f32),
    CancelNotify,
}

#[derive(Default)]
struct Script {
    calls: Vec<Call>,
    position: Ticks,
    rate: PlaybackRate,
    unsupported: HashSet<u32>,
    next_key: u64,
    fail_close: bool,
    volume: f32,
}

#[derive(Clone, Default)]
pub struct ScriptedEngine {
    script: Arc<Mutex<Script>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        let engine = Self::default();
        engine.script.lock().volume = 1.0;
        engine
    }

    pub fn calls(&self) -> Vec<Call> {
        self.script.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.script.lock().calls.clear();
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|call| predicate(call)).count()
    }

    pub fn set_position(&self, position: Ticks) {
        self.script.lock().position = position;
    }

    pub fn set_engine_rate(&self, rate: f32) {
        self.script.lock().rate.rate = rate;
    }

    /// Marks `rate` as unsupported without thinning.
    pub fn reject_unthinned(&self, rate: f32) {
        self.script.lock().unsupported.insert(rate.to_bits());
    }

    pub fn fail_close(&self) {
        self.script.lock().fail_close = true;
    }

    fn record(&self, call: Call) {
        self.script.lock().calls.push(call);
    }
}

impl EngineSession for ScriptedEngine {
    fn start(&self, position: StartPosition) -> Result<()> {
        let mut script = self.script.lock();
        if let StartPosition::At(at) = position {
            script.position = at;
        }
        script.calls.push(Call::Start(position));
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        self.record(Call::Pause);
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        self.record(Call::Stop);
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.record(Call::Close);
        if self.script.lock().fail_close {
            return Err(BridgeError::engine(-1, "close rejected"));
        }
        Ok(())
    }

    fn shutdown(&self) -> Result<()> {
        self.record(Call::Shutdown);
        Ok(())
    }

    fn duration(&self) -> Result<Ticks> {
        Ok(DURATION)
    }

    fn time_per_frame(&self) -> Option<Ticks> {
        Some(400_000)
    }

    fn presentation_clock(&self) -> Result<Arc<dyn PresentationClock>> {
        Ok(Arc::new(self.clone()))
    }

    fn rate_control(&self) -> Result<Arc<dyn RateControl>> {
        Ok(Arc::new(self.clone()))
    }

    fn timer_service(&self) -> Result<Arc<dyn TimerService>> {
        Ok(Arc::new(self.clone()))
    }

    fn stream_volume(&self) -> Result<Arc<dyn StreamVolume>> {
        Ok(Arc::new(self.clone()))
    }
}

impl EventSource for ScriptedEngine {
    fn begin_notify(&self, _sender: EventSender) -> Result<()> {
        Ok(())
    }

    fn cancel_notify(&self) -> Result<()> {
        self.record(Call::CancelNotify);
        Ok(())
    }

    fn try_next_event(&self) -> Result<Option<SessionMessage>> {
        Ok(None)
    }
}

impl PresentationClock for ScriptedEngine {
    fn time(&self) -> Result<Ticks> {
        Ok(self.script.lock().position)
    }
}

impl RateControl for ScriptedEngine {
    fn rate(&self) -> Result<PlaybackRate> {
        Ok(self.script.lock().rate)
    }

    fn set_rate(&self, thin: bool, rate: f32) -> Result<()> {
        let mut script = self.script.lock();
        script.rate = PlaybackRate::new(thin, rate);
        script.calls.push(Call::SetRate(thin, rate));
        Ok(())
    }

    fn is_rate_supported(&self, thin: bool, rate: f32) -> RateSupport {
        let script = self.script.lock();
        if !thin && script.unsupported.contains(&rate.to_bits()) {
            RateSupport::Unsupported { nearest: 1.0 }
        } else {
            RateSupport::Supported
        }
    }
}

impl TimerService for ScriptedEngine {
    fn arm(&self, at: Ticks, token: TimerToken) -> Result<CancelKey> {
        let mut script = self.script.lock();
        script.next_key += 1;
        script.calls.push(Call::Arm(at, token));
        Ok(CancelKey(script.next_key))
    }

    fn cancel(&self, key: CancelKey) -> Result<()> {
        self.record(Call::Cancel(key));
        Ok(())
    }
}

impl StreamVolume for ScriptedEngine {
    fn volume(&self) -> Result<f32> {
        Ok(self.script.lock().volume)
    }

    fn set_volume(&self, level: f32) -> Result<()> {
        let mut script = self.script.lock();
        script.volume = level;
        script.calls.push(Call::SetVolume(level));
        Ok(())
    }
}

pub fn event(kind: EventKind) -> SessionMessage {
    EngineEvent::new(kind).into()
}

pub fn ready() -> SessionMessage {
    EngineEvent::topology(TopologyStatus::Ready).into()
}

/// Async-mode controller over a scripted engine whose topology is ready.
pub async fn ready_controller(config: SessionConfig) -> (SessionController, ScriptedEngine) {
    let engine = ScriptedEngine::new();
    let controller = SessionController::new(Arc::new(engine.clone()), config).unwrap();
    controller.handle_message(ready()).await;
    assert_eq!(controller.state(), PlaybackState::Ready);
    (controller, engine)
}

/// Ready controller that has confirmed a start.
pub async fn started_controller(config: SessionConfig) -> (SessionController, ScriptedEngine) {
    let (controller, engine) = ready_controller(config).await;
    controller.start().await.unwrap();
    controller.handle_message(event(EventKind::Started)).await;
    assert_eq!(controller.state(), PlaybackState::Started);
    engine.clear_calls();
    (controller, engine)
}
