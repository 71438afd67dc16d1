//! # Core Runtime Module
//!
//! Ambient infrastructure shared by the playback crates:
//! - Logging and tracing setup
//! - Per-session configuration
//!
//! ## Overview
//!
//! Nothing in here knows about transport commands. The playback core takes a
//! [`SessionConfig`](config::SessionConfig) at construction and logs through
//! `tracing`; hosts call [`init_logging`](logging::init_logging) once at
//! startup to decide where those records go.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{ControlMode, SessionConfig, SessionConfigBuilder};
pub use error::{Error, Result};
