//! Playback state and the pending/cached action slots.

use bridge_traits::media_time::Ticks;
use bridge_traits::EventKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Authoritative state of a session, as last confirmed by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaybackState {
    /// No usable session yet: the topology has not been reported ready.
    NoSession,
    Ready,
    Started,
    Paused,
    Stopped,
    SeekingPosition,
    Closing,
    Closed,
}

impl PlaybackState {
    /// States in which a rate change needs no preceding pause.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Paused | Self::Stopped | Self::Ready)
    }

    pub fn is_closing_or_closed(&self) -> bool {
        matches!(self, Self::Closing | Self::Closed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoSession => "no_session",
            Self::Ready => "ready",
            Self::Started => "started",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
            Self::SeekingPosition => "seeking_position",
            Self::Closing => "closing",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a transport request awaiting (or queued behind) a confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ActionKind {
    #[default]
    None,
    SetStarted,
    SetPaused,
    SetStopped,
    SetRate,
    SetMediaPosition,
    SetClosed,
}

impl ActionKind {
    /// Event kind that confirms a request of this kind.
    pub fn confirmed_by(&self) -> Option<EventKind> {
        match self {
            Self::None => None,
            Self::SetStarted => Some(EventKind::Started),
            Self::SetPaused => Some(EventKind::Paused),
            Self::SetStopped => Some(EventKind::Stopped),
            Self::SetRate => Some(EventKind::RateChanged),
            Self::SetMediaPosition => Some(EventKind::ScrubSampleComplete),
            Self::SetClosed => Some(EventKind::Closed),
        }
    }
}

/// A transport request together with its arguments.
///
/// `time_value` carries the seek target, or the position a pause was
/// requested at; `rate_value` carries the requested rate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    pub time_value: Ticks,
    pub rate_value: f32,
}

/// The single in-flight request the engine accepted but has not confirmed.
pub type PendingAction = Action;

/// The newest request received while another one was pending.
pub type CachedAction = Action;

impl Action {
    pub const NONE: Action = Action {
        kind: ActionKind::None,
        time_value: 0,
        rate_value: 0.0,
    };

    pub fn of(kind: ActionKind) -> Self {
        Self {
            kind,
            ..Self::NONE
        }
    }

    pub fn paused_at(position: Ticks) -> Self {
        Self {
            time_value: position,
            ..Self::of(ActionKind::SetPaused)
        }
    }

    pub fn rate(rate: f32) -> Self {
        Self {
            rate_value: rate,
            ..Self::of(ActionKind::SetRate)
        }
    }

    pub fn media_position(position: Ticks) -> Self {
        Self {
            time_value: position,
            ..Self::of(ActionKind::SetMediaPosition)
        }
    }

    pub fn is(&self, kind: ActionKind) -> bool {
        self.kind == kind
    }

    pub fn is_none(&self) -> bool {
        self.kind == ActionKind::None
    }

    /// Resets the slot; the slot itself lives as long as the controller.
    pub fn clear(&mut self) {
        *self = Self::NONE;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_constructors() {
        let seek = Action::media_position(5_000);
        assert!(seek.is(ActionKind::SetMediaPosition));
        assert_eq!(seek.time_value, 5_000);

        let mut rate = Action::rate(2.0);
        assert_eq!(rate.rate_value, 2.0);
        rate.clear();
        assert!(rate.is_none());
        assert_eq!(rate, Action::default());
    }

    #[test]
    fn test_confirming_events() {
        assert_eq!(
            ActionKind::SetMediaPosition.confirmed_by(),
            Some(EventKind::ScrubSampleComplete)
        );
        assert_eq!(ActionKind::SetClosed.confirmed_by(), Some(EventKind::Closed));
        assert_eq!(ActionKind::None.confirmed_by(), None);
    }

    #[test]
    fn test_idle_states() {
        assert!(PlaybackState::Ready.is_idle());
        assert!(!PlaybackState::Started.is_idle());
        assert!(!PlaybackState::SeekingPosition.is_idle());
        assert_eq!(PlaybackState::SeekingPosition.to_string(), "seeking_position");
    }
}
