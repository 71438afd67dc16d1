//! Synchronization primitives.
//!
//! All primitives are `Send + Sync` and async-aware: waiting on a lock or a
//! channel yields to the executor instead of blocking the thread.
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::{watch, Mutex};
//!
//! async fn example() {
//!     let mutex = Mutex::new(0u32);
//!     *mutex.lock().await += 1;
//!
//!     let (tx, mut rx) = watch::channel(false);
//!     tx.send_replace(true);
//!     assert!(*rx.borrow_and_update());
//! }
//! ```

pub use tokio::sync::{mpsc, oneshot, watch, Mutex, MutexGuard, Notify};
