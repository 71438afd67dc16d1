//! Engine events and the channel that carries them.
//!
//! Completion of every transport command is reported as an [`EngineEvent`].
//! Timer expirations travel on the same channel as
//! [`SessionMessage::TimerFired`], so a single consumer sees both in the
//! order they were produced.

use core_async::sync::mpsc;
use serde::{Deserialize, Serialize};

use crate::{error::Result, platform::PlatformSendSync, timer::TimerToken};

/// Kind of a session event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    TopologySet,
    TopologyStatus,
    Started,
    Paused,
    Stopped,
    Closed,
    Ended,
    EndOfPresentation,
    RateChanged,
    ScrubSampleComplete,
    CapabilitiesChanged,
    /// Any engine event the core has no handling for.
    Other(u32),
}

/// Status attached to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventStatus {
    Succeeded,
    /// The operation the event reports failed with a platform status code.
    Failed(i32),
    /// The status could not be read from the event.
    Unavailable,
}

impl EventStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// Topology status carried by `TopologyStatus` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TopologyStatus {
    Invalid,
    Ready,
    StartedSource,
    Dynamic,
    SinkSwitched,
    Ended,
}

/// An event produced by the engine session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineEvent {
    pub kind: EventKind,
    pub status: EventStatus,
    pub topology_status: Option<TopologyStatus>,
}

impl EngineEvent {
    /// A successful event of the given kind.
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            status: EventStatus::Succeeded,
            topology_status: None,
        }
    }

    /// A failed event of the given kind.
    pub fn failed(kind: EventKind, code: i32) -> Self {
        Self {
            status: EventStatus::Failed(code),
            ..Self::new(kind)
        }
    }

    pub fn topology(status: TopologyStatus) -> Self {
        Self {
            topology_status: Some(status),
            ..Self::new(EventKind::TopologyStatus)
        }
    }

    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.status = status;
        self
    }

    /// True for the `TopologyStatus(Ready)` event.
    pub fn is_topology_ready(&self) -> bool {
        self.kind == EventKind::TopologyStatus
            && self.topology_status == Some(TopologyStatus::Ready)
    }
}

/// Everything delivered on a session's notification channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SessionMessage {
    Engine(EngineEvent),
    /// A timer armed through [`TimerService`](crate::timer::TimerService)
    /// expired or was cancelled.
    TimerFired { token: TimerToken, status: EventStatus },
}

impl SessionMessage {
    /// The engine event kind, `None` for timer expirations.
    pub fn event_kind(&self) -> Option<EventKind> {
        match self {
            Self::Engine(event) => Some(event.kind),
            Self::TimerFired { .. } => None,
        }
    }
}

impl From<EngineEvent> for SessionMessage {
    fn from(event: EngineEvent) -> Self {
        Self::Engine(event)
    }
}

/// Sending half of a session's notification channel.
pub type EventSender = mpsc::UnboundedSender<SessionMessage>;

/// Source of session events.
///
/// A session is consumed either in push mode ([`begin_notify`]) or by polling
/// ([`try_next_event`]), never both at once.
///
/// [`begin_notify`]: EventSource::begin_notify
/// [`try_next_event`]: EventSource::try_next_event
pub trait EventSource: PlatformSendSync {
    /// Starts delivering every event, including timer expirations, to
    /// `sender`. Events queued before the call are flushed first.
    fn begin_notify(&self, sender: EventSender) -> Result<()>;

    /// Stops push delivery and drops the registered sender.
    fn cancel_notify(&self) -> Result<()>;

    /// Returns the next queued event without waiting.
    fn try_next_event(&self) -> Result<Option<SessionMessage>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topology_ready_detection() {
        assert!(EngineEvent::topology(TopologyStatus::Ready).is_topology_ready());
        assert!(!EngineEvent::topology(TopologyStatus::StartedSource).is_topology_ready());
        assert!(!EngineEvent::new(EventKind::TopologySet).is_topology_ready());
    }

    #[test]
    fn test_message_kind() {
        let started: SessionMessage = EngineEvent::new(EventKind::Started).into();
        assert_eq!(started.event_kind(), Some(EventKind::Started));

        let timer = SessionMessage::TimerFired {
            token: TimerToken::Stop,
            status: EventStatus::Succeeded,
        };
        assert_eq!(timer.event_kind(), None);
    }

    #[test]
    fn test_failed_event_keeps_kind() {
        let event = EngineEvent::failed(EventKind::RateChanged, -5);
        assert_eq!(event.kind, EventKind::RateChanged);
        assert!(!event.status.is_success());
    }
}
