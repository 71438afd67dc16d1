//! # Engine Bridge Traits
//!
//! Contract between the playback core and the platform media engine that
//! actually runs the decode/render pipeline.
//!
//! ## Overview
//!
//! The engine executes transport commands asynchronously: a call such as
//! [`EngineSession::start`](engine::EngineSession::start) only dispatches the
//! command, and the engine later confirms it with an out-of-band
//! [`EngineEvent`](event::EngineEvent). The core never assumes a command has
//! taken effect until that confirmation is observed.
//!
//! ## Traits
//!
//! ### Session
//! - [`EngineSession`](engine::EngineSession) - transport commands and service lookup
//! - [`EventSource`](event::EventSource) - push notification or non-blocking poll of events
//! - [`MediaEngine`](engine::MediaEngine) - both of the above, as handed to the core
//!
//! ### Session services
//! - [`PresentationClock`](engine::PresentationClock) - current presentation time
//! - [`RateControl`](engine::RateControl) - rate get/set and support probing
//! - [`TimerService`](timer::TimerService) - one-shot timers on the presentation clock
//! - [`StreamVolume`](engine::StreamVolume) - per-stream audio volume
//!
//! ### Utilities
//! - [`LoggerSink`](logging::LoggerSink) - forward structured logs to the host
//!
//! ## Time base
//!
//! All positions and durations are [`Ticks`](media_time::Ticks) of 100 ns.
//!
//! ## Thread Safety
//!
//! Every trait requires `Send + Sync` (through
//! [`PlatformSendSync`](platform::PlatformSendSync)). Confirmation events may
//! be produced on engine threads while callers issue commands from others.
//!
//! ## Implementations
//!
//! | Engine | Crate |
//! |--------|-------|
//! | Software loopback | `bridge-loopback` |
//! | Platform engines | provided by the host |

pub mod engine;
pub mod error;
pub mod event;
pub mod logging;
pub mod media_time;
pub mod platform;
pub mod timer;

pub use error::BridgeError;

pub use engine::{
    EngineSession, MediaEngine, PlaybackRate, PresentationClock, RateControl, RateSupport,
    StartPosition, StreamVolume,
};
pub use event::{
    EngineEvent, EventKind, EventSender, EventSource, EventStatus, SessionMessage, TopologyStatus,
};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use media_time::{Ticks, TICKS_PER_MILLISECOND, TICKS_PER_SECOND};
pub use timer::{CancelKey, TimerService, TimerToken};
