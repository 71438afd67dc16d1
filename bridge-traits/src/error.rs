use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    /// The engine rejected a call with a platform status code.
    #[error("Engine call failed with status {code:#010x}: {message}")]
    Engine { code: i32, message: String },

    #[error("Engine session has been shut down")]
    Shutdown,
}

impl BridgeError {
    /// Convenience constructor for status-code failures.
    pub fn engine(code: i32, message: impl Into<String>) -> Self {
        Self::Engine {
            code,
            message: message.into(),
        }
    }

    /// Platform status code, when the failure carries one.
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::Engine { code, .. } => Some(*code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
