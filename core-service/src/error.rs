use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Playback error: {0}")]
    Playback(#[from] core_playback::PlaybackError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    /// Frame stepping needs the frame duration, which audio-only media and
    /// sessions that are not ready yet do not report.
    #[error("Media has no frame timing")]
    NoFrameTiming,
}

impl ServiceError {
    /// See [`PlaybackError::is_soft`](core_playback::PlaybackError::is_soft).
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::Playback(err) if err.is_soft())
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
