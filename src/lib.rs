//! Workspace entry crate.
//!
//! Re-exports the host façade and the playback core so applications can
//! depend on `playctl-workspace` alone.

pub use core_playback;
pub use core_service::{MediaPlayer, Result, ServiceError};
