//! Runtime utilities for synchronous hosts.
//!
//! Hosts that have no executor of their own (binding layers, demo binaries,
//! `#[core_async::test]` functions) drive futures through [`block_on`].

pub use tokio::runtime::{Builder, Handle, Runtime};

/// Runs the provided future to completion on a fresh current-thread runtime.
pub fn block_on<F>(future: F) -> F::Output
where
    F: std::future::Future,
{
    Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("core_async::runtime::block_on: failed to build Tokio runtime")
        .block_on(future)
}
