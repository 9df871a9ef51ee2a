//! Application layer errors.
//!
//! # Error Codes
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`AppError::CommandNotFound`] | `APP_COMMAND_NOT_FOUND` | No |
//! | [`AppError::Engine`] | delegated | delegated |

use janus_engine::EngineError;
use janus_types::ErrorCode;
use thiserror::Error;

/// Application layer error.
#[derive(Debug, Error)]
pub enum AppError {
    /// The requested command does not exist in the application spec.
    #[error("command not found: {0}")]
    CommandNotFound(String),

    /// An engine failure surfaced through the application layer.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl ErrorCode for AppError {
    fn code(&self) -> &'static str {
        match self {
            Self::CommandNotFound(_) => "APP_COMMAND_NOT_FOUND",
            Self::Engine(inner) => inner.code(),
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::CommandNotFound(_) => false,
            Self::Engine(inner) => inner.is_recoverable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_delegate_to_the_engine() {
        assert_eq!(
            AppError::CommandNotFound("x".into()).code(),
            "APP_COMMAND_NOT_FOUND"
        );
        assert_eq!(
            AppError::from(EngineError::NoDestination).code(),
            "ENGINE_NO_DESTINATION"
        );
    }
}
