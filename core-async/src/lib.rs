//! Async runtime abstraction for the playctl crates.
//!
//! Every other crate in the workspace reaches the executor through this crate
//! instead of naming tokio directly, so the runtime choice stays in one place.
//!
//! # Modules
//!
//! - `task`: task spawning, join and abort handles
//! - `time`: sleep, timeout, durations and instants
//! - `sync`: async-aware locks and channels
//! - `runtime`: blocking entry points for synchronous hosts
//!
//! # Examples
//!
//! ```rust
//! use core_async::task;
//! use core_async::time::{sleep, Duration};
//!
//! async fn example() {
//!     let handle = task::spawn(async {
//!         sleep(Duration::from_millis(5)).await;
//!         42
//!     });
//!     assert_eq!(handle.await.ok(), Some(42));
//! }
//! ```

// Entry-point/test macros so downstream crates never depend on tokio macros.
pub use core_async_macros::{main, test};

pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

pub use task::spawn;
pub use time::{sleep, Duration, Instant};
