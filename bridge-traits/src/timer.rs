//! One-shot timers on the presentation clock.

use serde::{Deserialize, Serialize};

use crate::{error::Result, media_time::Ticks, platform::PlatformSendSync};

/// Identifies which timer fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerToken {
    /// Configured stop position reached.
    Stop,
    /// Just before the end of the media.
    End,
}

/// Handle used to cancel an armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CancelKey(pub u64);

/// Arms timers that fire when the presentation clock reaches a deadline.
///
/// Expirations are delivered as
/// [`SessionMessage::TimerFired`](crate::event::SessionMessage::TimerFired)
/// on the session's notification channel.
pub trait TimerService: PlatformSendSync {
    /// Arms a one-shot timer for absolute presentation time `at`.
    fn arm(&self, at: Ticks, token: TimerToken) -> Result<CancelKey>;

    /// Cancels a timer. Cancelling an expired timer is not an error.
    fn cancel(&self, key: CancelKey) -> Result<()>;
}
