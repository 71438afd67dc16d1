//! # Session Configuration
//!
//! Per-session settings for the playback controller.
//!
//! ## Overview
//!
//! A [`SessionConfig`] is built once, validated, and passed by value into the
//! controller. Nothing reads configuration from globals after construction;
//! [`SessionConfig::from_env`] exists for hosts that used to steer the player
//! through process properties, and it reads the environment exactly once.
//!
//! ## Usage
//!
//! ```
//! use core_runtime::config::{ControlMode, SessionConfig};
//! use std::time::Duration;
//!
//! let config = SessionConfig::builder()
//!     .mode(ControlMode::Synchronous)
//!     .sync_event_budget(20)
//!     .close_timeout(Duration::from_secs(1))
//!     .build()
//!     .unwrap();
//!
//! assert!(config.is_synchronous());
//! ```
//!
//! ## Environment
//!
//! | Variable | Field |
//! |----------|-------|
//! | `PLAYCTL_SYNC_MODE` | `mode` (`true` selects `Synchronous`) |
//! | `PLAYCTL_DEBUG` | `debug` |
//! | `PLAYCTL_CORRECT_AT_PAUSE` | `correct_at_pause` |

use crate::error::{Error, Result};
use bridge_traits::media_time::{Ticks, TICKS_PER_MILLISECOND};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const ENV_SYNC_MODE: &str = "PLAYCTL_SYNC_MODE";
pub const ENV_DEBUG: &str = "PLAYCTL_DEBUG";
pub const ENV_CORRECT_AT_PAUSE: &str = "PLAYCTL_CORRECT_AT_PAUSE";

/// How command completion is observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlMode {
    /// Commands return after dispatch; an event processor applies
    /// confirmations as they arrive.
    #[default]
    Asynchronous,
    /// Commands poll the engine's event queue until their confirmation
    /// arrives or the retry budget runs out.
    Synchronous,
}

/// Playback controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub mode: ControlMode,

    /// Log the full payload of every processed event.
    #[serde(default)]
    pub debug: bool,

    /// After a confirmed pause, seek back to the position the pause was
    /// requested at. Async mode only.
    #[serde(default)]
    pub correct_at_pause: bool,

    /// Poll attempts per awaited event in synchronous mode.
    #[serde(default = "default_sync_event_budget")]
    pub sync_event_budget: u32,

    /// Sleep between empty polls in synchronous mode.
    #[serde(default = "default_sync_poll_interval")]
    pub sync_poll_interval: Duration,

    /// How long close waits for the `Closed` confirmation.
    #[serde(default = "default_close_timeout")]
    pub close_timeout: Duration,

    /// A stop timer pauses only when the clock is within this distance of
    /// the stop position.
    #[serde(default = "default_stop_time_tolerance")]
    pub stop_time_tolerance: Ticks,

    /// The end timer fires this long before the media duration.
    #[serde(default = "default_end_of_media_margin")]
    pub end_of_media_margin: Ticks,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: ControlMode::default(),
            debug: false,
            correct_at_pause: false,
            sync_event_budget: default_sync_event_budget(),
            sync_poll_interval: default_sync_poll_interval(),
            close_timeout: default_close_timeout(),
            stop_time_tolerance: default_stop_time_tolerance(),
            end_of_media_margin: default_end_of_media_margin(),
        }
    }
}

impl SessionConfig {
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    /// Defaults with the synchronous pump enabled.
    pub fn synchronous() -> Self {
        Self {
            mode: ControlMode::Synchronous,
            ..Default::default()
        }
    }

    /// Defaults overridden by the `PLAYCTL_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(sync) = lookup(ENV_SYNC_MODE) {
            if parse_flag(ENV_SYNC_MODE, &sync)? {
                config.mode = ControlMode::Synchronous;
            }
        }
        if let Some(debug) = lookup(ENV_DEBUG) {
            config.debug = parse_flag(ENV_DEBUG, &debug)?;
        }
        if let Some(correct) = lookup(ENV_CORRECT_AT_PAUSE) {
            config.correct_at_pause = parse_flag(ENV_CORRECT_AT_PAUSE, &correct)?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn is_synchronous(&self) -> bool {
        self.mode == ControlMode::Synchronous
    }

    /// Validates the configuration.
    ///
    /// This checks:
    /// - the synchronous retry budget is at least one attempt
    /// - the close timeout is non-zero
    /// - tolerances and margins are non-negative
    pub fn validate(&self) -> Result<()> {
        if self.sync_event_budget == 0 {
            return Err(Error::Config(
                "sync_event_budget must be at least 1".to_string(),
            ));
        }

        if self.close_timeout.is_zero() {
            return Err(Error::Config("close_timeout must be non-zero".to_string()));
        }

        if self.stop_time_tolerance < 0 {
            return Err(Error::Config(
                "stop_time_tolerance cannot be negative".to_string(),
            ));
        }

        if self.end_of_media_margin < 0 {
            return Err(Error::Config(
                "end_of_media_margin cannot be negative".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(Error::Config(format!(
            "{key} must be a boolean flag, got '{other}'"
        ))),
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_sync_event_budget() -> u32 {
    10
}

fn default_sync_poll_interval() -> Duration {
    Duration::from_millis(20)
}

fn default_close_timeout() -> Duration {
    Duration::from_secs(3)
}

fn default_stop_time_tolerance() -> Ticks {
    100 * TICKS_PER_MILLISECOND
}

fn default_end_of_media_margin() -> Ticks {
    200 * TICKS_PER_MILLISECOND
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`SessionConfig`]; unset fields keep their defaults.
#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    pub fn mode(mut self, mode: ControlMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn debug(mut self, enabled: bool) -> Self {
        self.config.debug = enabled;
        self
    }

    pub fn correct_at_pause(mut self, enabled: bool) -> Self {
        self.config.correct_at_pause = enabled;
        self
    }

    pub fn sync_event_budget(mut self, attempts: u32) -> Self {
        self.config.sync_event_budget = attempts;
        self
    }

    pub fn sync_poll_interval(mut self, interval: Duration) -> Self {
        self.config.sync_poll_interval = interval;
        self
    }

    pub fn close_timeout(mut self, timeout: Duration) -> Self {
        self.config.close_timeout = timeout;
        self
    }

    pub fn stop_time_tolerance(mut self, tolerance: Ticks) -> Self {
        self.config.stop_time_tolerance = tolerance;
        self
    }

    pub fn end_of_media_margin(mut self, margin: Ticks) -> Self {
        self.config.end_of_media_margin = margin;
        self
    }

    /// Validates and returns the configuration.
    pub fn build(self) -> Result<SessionConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.mode, ControlMode::Asynchronous);
        assert_eq!(config.sync_event_budget, 10);
        assert_eq!(config.close_timeout, Duration::from_secs(3));
        assert_eq!(config.stop_time_tolerance, 1_000_000);
        assert_eq!(config.end_of_media_margin, 2_000_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_overrides() {
        let config = SessionConfig::builder()
            .mode(ControlMode::Synchronous)
            .debug(true)
            .correct_at_pause(true)
            .sync_event_budget(3)
            .build()
            .unwrap();

        assert!(config.is_synchronous());
        assert!(config.debug);
        assert!(config.correct_at_pause);
        assert_eq!(config.sync_event_budget, 3);
    }

    #[test]
    fn test_validate_rejects_zero_budget() {
        let result = SessionConfig::builder().sync_event_budget(0).build();
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("sync_event_budget"));
    }

    #[test]
    fn test_validate_rejects_zero_close_timeout() {
        let result = SessionConfig::builder()
            .close_timeout(Duration::ZERO)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_negative_tolerance() {
        let result = SessionConfig::builder().stop_time_tolerance(-1).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_from_lookup_reads_flags() {
        let vars: HashMap<&str, &str> = [
            (ENV_SYNC_MODE, "true"),
            (ENV_DEBUG, "1"),
            (ENV_CORRECT_AT_PAUSE, "off"),
        ]
        .into_iter()
        .collect();

        let config =
            SessionConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
        assert!(config.is_synchronous());
        assert!(config.debug);
        assert!(!config.correct_at_pause);
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let result = SessionConfig::from_lookup(|key| {
            (key == ENV_DEBUG).then(|| "maybe".to_string())
        });
        assert!(result.unwrap_err().to_string().contains(ENV_DEBUG));
    }

    #[test]
    fn test_serde_fills_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{ "mode": "synchronous", "debug": true }"#).unwrap();
        assert!(config.is_synchronous());
        assert!(config.debug);
        assert_eq!(config.sync_event_budget, 10);
        assert_eq!(config.sync_poll_interval, Duration::from_millis(20));
    }
}
