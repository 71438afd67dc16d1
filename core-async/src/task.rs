//! Task spawning and handles.
//!
//! Spawned futures must be `Send + 'static`; the event processor and the
//! loopback engine's timers run on these tasks.

pub use tokio::task::{yield_now, AbortHandle, JoinError, JoinHandle};

/// Spawns a future onto the current runtime.
///
/// Panics when called outside a runtime context, like `tokio::spawn`.
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::spawn(future)
}

/// Result of awaiting a spawned task.
pub type Result<T> = std::result::Result<T, JoinError>;
