//! Time-related abstractions.
//!
//! `sleep` and `timeout` integrate with the runtime's timer wheel; `Instant`
//! is monotonic and used for the loopback engine's virtual clock.

pub use tokio::time::{error::Elapsed, sleep, timeout};

pub use std::time::{Duration, Instant};
