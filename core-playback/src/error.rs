//! # Playback Error Types
//!
//! Errors returned by the session controller. Engine failures are reported
//! at the call that dispatched them; nothing is retried implicitly.

use bridge_traits::{media_time::Ticks, BridgeError, EventKind};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::state::PlaybackState;

/// How long a wait was allowed to run before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitBudget {
    /// Synchronous pump attempts.
    Attempts(u32),
    /// Wall-clock wait.
    Elapsed(Duration),
}

impl fmt::Display for WaitBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attempts(n) => write!(f, "{n} attempts"),
            Self::Elapsed(d) => write!(f, "{d:?}"),
        }
    }
}

/// Errors that can occur while controlling a session.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Request Errors
    // ========================================================================
    /// The request is not legal in the current state. Nothing was dispatched.
    #[error("Invalid request: cannot {operation} while {state}")]
    InvalidRequest {
        operation: &'static str,
        state: PlaybackState,
    },

    /// No engine session is available (not ready yet, or torn down).
    #[error("No engine session available")]
    NotInitialized,

    /// Seek target outside `[0, duration]`. Nothing was dispatched.
    #[error("Position {requested} is outside the media range [0, {duration}]")]
    PositionOutOfRange { requested: Ticks, duration: Ticks },

    #[error("Invalid rate: {0}")]
    InvalidRate(f32),

    /// Volume must be in range [0.0, 1.0].
    #[error("Invalid volume: {0} (must be between 0.0 and 1.0)")]
    InvalidVolume(f32),

    // ========================================================================
    // Engine Errors
    // ========================================================================
    /// The engine rejected a call.
    #[error("Engine failure: {0}")]
    Engine(#[from] BridgeError),

    /// A confirmation did not arrive within the allowed budget.
    #[error("Timed out waiting for {awaited:?} after {budget}")]
    Timeout { awaited: EventKind, budget: WaitBudget },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),
}

impl PlaybackError {
    pub(crate) fn invalid(operation: &'static str, state: PlaybackState) -> Self {
        Self::InvalidRequest { operation, state }
    }

    /// Returns `true` for failures that leave the session usable and that
    /// callers may ignore.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            PlaybackError::Timeout { .. } | PlaybackError::PositionOutOfRange { .. }
        )
    }

    pub fn is_invalid_request(&self) -> bool {
        matches!(self, PlaybackError::InvalidRequest { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, PlaybackError::Timeout { .. })
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_errors() {
        let timeout = PlaybackError::Timeout {
            awaited: EventKind::Paused,
            budget: WaitBudget::Attempts(10),
        };
        assert!(timeout.is_soft());
        assert!(timeout.to_string().contains("10 attempts"));

        let range = PlaybackError::PositionOutOfRange {
            requested: -1,
            duration: 100,
        };
        assert!(range.is_soft());

        let engine = PlaybackError::from(BridgeError::Shutdown);
        assert!(!engine.is_soft());
    }

    #[test]
    fn test_invalid_request_message() {
        let err = PlaybackError::invalid("pause", PlaybackState::Stopped);
        assert!(err.is_invalid_request());
        assert_eq!(err.to_string(), "Invalid request: cannot pause while stopped");
    }
}
