//! Thread-safety marker traits shared by every bridge trait.
//!
//! Engine implementations are shared between caller tasks and the event
//! processor, so every bridge object must be `Send + Sync`. Keeping the bound
//! behind a named marker lets trait definitions stay short.

/// Marker trait for `Send + Sync` bridge objects.
pub trait PlatformSendSync: Send + Sync {}

impl<T> PlatformSendSync for T where T: Send + Sync + ?Sized {}

/// Marker trait equivalent to `Send`.
pub trait PlatformSend: Send {}

impl<T> PlatformSend for T where T: Send + ?Sized {}
