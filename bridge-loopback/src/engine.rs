//! Loopback engine session.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use bridge_traits::{
    error::{BridgeError, Result},
    media_time::Ticks,
    CancelKey, EngineEvent, EngineSession, EventKind, EventSender, EventSource, EventStatus,
    PlaybackRate, PresentationClock, RateControl, RateSupport, SessionMessage, StartPosition,
    StreamVolume, TimerService, TimerToken, TopologyStatus,
};
use core_async::runtime::Handle;
use core_async::task::AbortHandle;
use core_async::time::sleep;
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::clock::VirtualClock;
use crate::config::LoopbackConfig;

/// Status code reported for rejected rates, matching the platform's
/// "unsupported rate" failure.
const UNSUPPORTED_RATE: i32 = 0xC00D_3E9Bu32 as i32;

/// Simulated engine session. Cloning yields another handle to the same
/// session; the clock, rate control, timer and volume services are handles
/// too.
#[derive(Clone)]
pub struct LoopbackEngine {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    config: LoopbackConfig,
    clock: VirtualClock,
    thin: bool,
    volume: f32,
    queue: VecDeque<SessionMessage>,
    sender: Option<EventSender>,
    timers: HashMap<u64, AbortHandle>,
    next_timer: u64,
    failures: HashMap<EventKind, i32>,
    shut_down: bool,
}

impl Inner {
    fn emit(&mut self, message: SessionMessage) {
        let message = match message {
            SessionMessage::Engine(event) => match self.failures.remove(&event.kind) {
                Some(code) => event.with_status(EventStatus::Failed(code)).into(),
                None => message,
            },
            timer => timer,
        };
        trace!(?message, "loopback event");

        if let Some(sender) = self.sender.as_ref() {
            if sender.send(message).is_ok() {
                return;
            }
            debug!("event receiver dropped, queueing");
            self.sender = None;
        }
        self.queue.push_back(message);
    }

    fn emit_event(&mut self, kind: EventKind) {
        self.emit(EngineEvent::new(kind).into());
    }

    fn ensure_open(&self) -> Result<()> {
        if self.shut_down {
            Err(BridgeError::Shutdown)
        } else {
            Ok(())
        }
    }

    fn rate_support(&self, thin: bool, rate: f32) -> RateSupport {
        let magnitude = rate.abs();
        let limit = if thin {
            self.config.max_thinned_rate
        } else {
            self.config.max_rate
        };
        if magnitude <= limit {
            RateSupport::Supported
        } else {
            RateSupport::Unsupported {
                nearest: limit.copysign(rate),
            }
        }
    }
}

impl LoopbackEngine {
    pub fn new(config: LoopbackConfig) -> Self {
        let mut inner = Inner {
            clock: VirtualClock::new(config.duration),
            thin: false,
            volume: 1.0,
            queue: VecDeque::new(),
            sender: None,
            timers: HashMap::new(),
            next_timer: 1,
            failures: HashMap::new(),
            shut_down: false,
            config,
        };
        if inner.config.ready_on_open {
            inner.emit_event(EventKind::TopologySet);
            inner.emit(EngineEvent::topology(TopologyStatus::Ready).into());
        }
        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Delivers `message` as if the engine had produced it.
    pub fn inject(&self, message: impl Into<SessionMessage>) {
        self.inner.lock().emit(message.into());
    }

    /// Reports the next event of `kind` with a failure status.
    pub fn fail_next(&self, kind: EventKind, code: i32) {
        self.inner.lock().failures.insert(kind, code);
    }

    /// Number of events waiting to be polled.
    pub fn queued_events(&self) -> usize {
        self.inner.lock().queue.len()
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.lock().shut_down
    }

    /// Number of timers armed and not yet fired or cancelled.
    pub fn armed_timers(&self) -> usize {
        self.inner.lock().timers.len()
    }
}

impl Default for LoopbackEngine {
    fn default() -> Self {
        Self::new(LoopbackConfig::default())
    }
}

impl EngineSession for LoopbackEngine {
    fn start(&self, position: StartPosition) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.ensure_open()?;
        if let StartPosition::At(at) = position {
            inner.clock.seek(at);
        }
        inner.clock.run();
        inner.emit_event(EventKind::Started);
        if matches!(position, StartPosition::At(_)) && inner.clock.rate() == 0.0 {
            inner.emit_event(EventKind::ScrubSampleComplete);
        }
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.ensure_open()?;
        inner.clock.freeze();
        inner.emit_event(EventKind::Paused);
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.ensure_open()?;
        inner.clock.freeze();
        inner.clock.seek(0);
        inner.emit_event(EventKind::Stopped);
        Ok(())
    }

    fn close(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.ensure_open()?;
        inner.clock.freeze();
        inner.emit_event(EventKind::Closed);
        Ok(())
    }

    fn shutdown(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.ensure_open()?;
        for (_, handle) in inner.timers.drain() {
            handle.abort();
        }
        inner.sender = None;
        inner.queue.clear();
        inner.shut_down = true;
        debug!("loopback session shut down");
        Ok(())
    }

    fn duration(&self) -> Result<Ticks> {
        let inner = self.inner.lock();
        inner.ensure_open()?;
        Ok(inner.config.duration)
    }

    fn time_per_frame(&self) -> Option<Ticks> {
        self.inner.lock().config.time_per_frame
    }

    fn presentation_clock(&self) -> Result<Arc<dyn PresentationClock>> {
        self.inner.lock().ensure_open()?;
        Ok(Arc::new(self.clone()))
    }

    fn rate_control(&self) -> Result<Arc<dyn RateControl>> {
        self.inner.lock().ensure_open()?;
        Ok(Arc::new(self.clone()))
    }

    fn timer_service(&self) -> Result<Arc<dyn TimerService>> {
        self.inner.lock().ensure_open()?;
        Ok(Arc::new(self.clone()))
    }

    fn stream_volume(&self) -> Result<Arc<dyn StreamVolume>> {
        self.inner.lock().ensure_open()?;
        Ok(Arc::new(self.clone()))
    }
}

impl EventSource for LoopbackEngine {
    fn begin_notify(&self, sender: EventSender) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.ensure_open()?;
        while let Some(message) = inner.queue.pop_front() {
            if sender.send(message).is_err() {
                return Err(BridgeError::OperationFailed(
                    "event receiver closed".to_string(),
                ));
            }
        }
        inner.sender = Some(sender);
        Ok(())
    }

    fn cancel_notify(&self) -> Result<()> {
        self.inner.lock().sender = None;
        Ok(())
    }

    fn try_next_event(&self) -> Result<Option<SessionMessage>> {
        let mut inner = self.inner.lock();
        inner.ensure_open()?;
        Ok(inner.queue.pop_front())
    }
}

impl PresentationClock for LoopbackEngine {
    fn time(&self) -> Result<Ticks> {
        let inner = self.inner.lock();
        inner.ensure_open()?;
        Ok(inner.clock.now())
    }
}

impl RateControl for LoopbackEngine {
    fn rate(&self) -> Result<PlaybackRate> {
        let inner = self.inner.lock();
        inner.ensure_open()?;
        Ok(PlaybackRate::new(inner.thin, inner.clock.rate()))
    }

    fn set_rate(&self, thin: bool, rate: f32) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.ensure_open()?;
        if !inner.rate_support(thin, rate).is_supported() {
            return Err(BridgeError::engine(
                UNSUPPORTED_RATE,
                format!("rate {rate} (thin: {thin}) is not supported"),
            ));
        }
        inner.thin = thin;
        inner.clock.set_rate(rate);
        inner.emit_event(EventKind::RateChanged);
        Ok(())
    }

    fn is_rate_supported(&self, thin: bool, rate: f32) -> RateSupport {
        self.inner.lock().rate_support(thin, rate)
    }
}

impl StreamVolume for LoopbackEngine {
    fn volume(&self) -> Result<f32> {
        let inner = self.inner.lock();
        inner.ensure_open()?;
        Ok(inner.volume)
    }

    fn set_volume(&self, level: f32) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.ensure_open()?;
        inner.volume = level.clamp(0.0, 1.0);
        Ok(())
    }
}

impl TimerService for LoopbackEngine {
    fn arm(&self, at: Ticks, token: TimerToken) -> Result<CancelKey> {
        let runtime = Handle::try_current()
            .map_err(|_| BridgeError::NotAvailable("timers need an async runtime".to_string()))?;

        let mut inner = self.inner.lock();
        inner.ensure_open()?;
        let key = inner.next_timer;
        inner.next_timer += 1;

        let shared = Arc::clone(&self.inner);
        let resolution = inner.config.timer_resolution;
        let task = runtime.spawn(async move {
            loop {
                {
                    let mut inner = shared.lock();
                    if inner.clock.now() >= at {
                        inner.timers.remove(&key);
                        inner.emit(SessionMessage::TimerFired {
                            token,
                            status: EventStatus::Succeeded,
                        });
                        return;
                    }
                }
                sleep(resolution).await;
            }
        });
        inner.timers.insert(key, task.abort_handle());
        debug!(?token, at, key, "timer armed");
        Ok(CancelKey(key))
    }

    fn cancel(&self, key: CancelKey) -> Result<()> {
        let mut inner = self.inner.lock();
        match inner.timers.remove(&key.0) {
            Some(handle) => handle.abort(),
            None => warn!(?key, "cancel for unknown or expired timer"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::media_time::TICKS_PER_SECOND;
    use core_async::sync::mpsc;
    use std::time::Duration;

    fn drain(engine: &LoopbackEngine) -> Vec<EventKind> {
        let mut kinds = Vec::new();
        while let Some(message) = engine.try_next_event().unwrap() {
            if let Some(kind) = message.event_kind() {
                kinds.push(kind);
            }
        }
        kinds
    }

    #[test]
    fn test_topology_ready_on_open() {
        let engine = LoopbackEngine::default();
        let first = engine.try_next_event().unwrap().unwrap();
        let second = engine.try_next_event().unwrap().unwrap();
        assert_eq!(first.event_kind(), Some(EventKind::TopologySet));
        assert!(matches!(second, SessionMessage::Engine(event) if event.is_topology_ready()));
        assert!(engine.try_next_event().unwrap().is_none());
    }

    #[test]
    fn test_scrub_start_confirms_seek() {
        let engine = LoopbackEngine::default();
        drain(&engine);

        engine.set_rate(false, 0.0).unwrap();
        engine.start(StartPosition::At(5 * TICKS_PER_SECOND)).unwrap();

        assert_eq!(
            drain(&engine),
            vec![
                EventKind::RateChanged,
                EventKind::Started,
                EventKind::ScrubSampleComplete
            ]
        );
        assert_eq!(engine.time().unwrap(), 5 * TICKS_PER_SECOND);
    }

    #[test]
    fn test_rate_support_limits() {
        let engine = LoopbackEngine::new(LoopbackConfig::default().with_rate_limits(2.0, 8.0));
        assert!(engine.is_rate_supported(false, -2.0).is_supported());
        assert_eq!(
            engine.is_rate_supported(false, 4.0),
            RateSupport::Unsupported { nearest: 2.0 }
        );
        assert!(engine.is_rate_supported(true, 4.0).is_supported());
        assert_eq!(
            engine.is_rate_supported(true, -16.0),
            RateSupport::Unsupported { nearest: -8.0 }
        );

        let err = engine.set_rate(false, 4.0).unwrap_err();
        assert_eq!(err.code(), Some(UNSUPPORTED_RATE));
    }

    #[test]
    fn test_failure_injection_applies_once() {
        let engine = LoopbackEngine::default();
        drain(&engine);
        engine.fail_next(EventKind::Paused, -5);

        engine.pause().unwrap();
        engine.pause().unwrap();

        let first = engine.try_next_event().unwrap().unwrap();
        let second = engine.try_next_event().unwrap().unwrap();
        assert!(matches!(first, SessionMessage::Engine(e) if e.status == EventStatus::Failed(-5)));
        assert!(matches!(second, SessionMessage::Engine(e) if e.status.is_success()));
    }

    #[core_async::test]
    async fn test_push_mode_flushes_queue() {
        let engine = LoopbackEngine::default();
        let (tx, mut rx) = mpsc::unbounded_channel();
        engine.begin_notify(tx).unwrap();
        engine.stop().unwrap();

        let mut kinds = Vec::new();
        for _ in 0..3 {
            kinds.push(rx.recv().await.unwrap().event_kind().unwrap());
        }
        assert_eq!(
            kinds,
            vec![EventKind::TopologySet, EventKind::TopologyStatus, EventKind::Stopped]
        );
        assert_eq!(engine.queued_events(), 0);
    }

    #[core_async::test]
    async fn test_timer_fires_on_clock() {
        let engine = LoopbackEngine::default();
        drain(&engine);

        engine.start(StartPosition::At(0)).unwrap();
        engine.arm(100_000, TimerToken::End).unwrap();
        assert_eq!(engine.armed_timers(), 1);

        sleep(Duration::from_millis(60)).await;
        let fired = drain_timers(&engine);
        assert_eq!(fired, vec![TimerToken::End]);
        assert_eq!(engine.armed_timers(), 0);
    }

    #[core_async::test]
    async fn test_cancelled_timer_never_fires() {
        let engine = LoopbackEngine::default();
        drain(&engine);

        let key = engine.arm(100_000, TimerToken::Stop).unwrap();
        engine.cancel(key).unwrap();
        engine.start(StartPosition::Current).unwrap();

        sleep(Duration::from_millis(60)).await;
        assert!(drain_timers(&engine).is_empty());
    }

    #[test]
    fn test_commands_fail_after_shutdown() {
        let engine = LoopbackEngine::default();
        engine.shutdown().unwrap();
        assert!(engine.is_shut_down());
        assert!(matches!(engine.start(StartPosition::Current), Err(BridgeError::Shutdown)));
        assert!(matches!(engine.try_next_event(), Err(BridgeError::Shutdown)));
    }

    fn drain_timers(engine: &LoopbackEngine) -> Vec<TimerToken> {
        let mut tokens = Vec::new();
        while let Some(message) = engine.try_next_event().unwrap() {
            if let SessionMessage::TimerFired { token, .. } = message {
                tokens.push(token);
            }
        }
        tokens
    }
}
