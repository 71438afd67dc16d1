//! # Loopback Engine
//!
//! In-process implementation of the engine bridge traits.
//!
//! ## Overview
//!
//! [`LoopbackEngine`] behaves like a platform media session without decoding
//! anything:
//! - A virtual presentation clock that advances with wall time and rate
//! - Every transport command confirmed asynchronously by a queued event
//! - Push delivery (`begin_notify`) or polling (`try_next_event`)
//! - Rate support limits with thinning and nearest-rate reporting
//! - One-shot timers on the virtual clock
//!
//! It backs the demo player and the integration tests of the playback core.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_loopback::{LoopbackConfig, LoopbackEngine};
//! use std::sync::Arc;
//!
//! let engine = Arc::new(LoopbackEngine::new(LoopbackConfig::default()));
//! let controller = SessionController::new(engine, SessionConfig::default())?;
//! ```

mod clock;
mod config;
mod engine;

pub use config::LoopbackConfig;
pub use engine::LoopbackEngine;
