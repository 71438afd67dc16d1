//! # Playback Control Module
//!
//! Drives an asynchronous media engine through a confirmed state machine.
//!
//! ## Overview
//!
//! This module handles:
//! - Start, pause, stop and close with engine confirmation
//! - Seeking by scrub, with overlapping seeks coalesced
//! - Rate changes with thinning and nearest-rate fallback
//! - Stop-position and end-of-media timers
//! - A synchronous mode that pumps the engine's event queue
//!
//! The engine itself is abstracted by [`bridge_traits::MediaEngine`].

mod controller;
pub mod error;
mod position;
mod processor;
mod pump;
mod rate;
mod services;
mod session;
pub mod state;
mod timers;

pub use controller::SessionController;
pub use error::{PlaybackError, Result, WaitBudget};
pub use processor::{EventProcessor, ProcessOutcome};
pub use state::{Action, ActionKind, CachedAction, PendingAction, PlaybackState};
