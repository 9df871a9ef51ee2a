//! Engine layer errors.
//!
//! # Error Codes
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`EngineError::NoDestination`] | `ENGINE_NO_DESTINATION` | No |
//! | [`EngineError::SurfaceClosed`] | `ENGINE_SURFACE_CLOSED` | No |
//! | [`EngineError::CommandNotFound`] | `ENGINE_COMMAND_NOT_FOUND` | No |
//! | [`EngineError::SpawnFailed`] | `ENGINE_SPAWN_FAILED` | Yes |
//! | [`EngineError::IncludeStreaming`] | `ENGINE_INCLUDE_STREAMING` | No |
//!
//! `NoDestination` deserves a note: an emission outside any capture
//! scope, with no immediate-output fallback installed, is a broken
//! capture-scope invariant, a programming error. It is surfaced loudly
//! (`tracing::error` plus an `Err` on the internal routing path) and
//! never silently swallowed, but it is *not* converted into a visible
//! emission: there is no view to emit it to.

use janus_spec::{BodyError, ValidationError};
use janus_types::{ErrorCode, ViewKey};
use thiserror::Error;

/// Engine layer error.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// An emission occurred with no active capture scope and no
    /// immediate-output fallback.
    #[error("emission has no resolvable destination")]
    NoDestination,

    /// The surface command channel is closed (owner task gone).
    #[error("surface channel closed")]
    SurfaceClosed,

    /// No command with this key exists in the application spec.
    #[error("command not found: {0}")]
    CommandNotFound(ViewKey),

    /// The background worker thread could not be spawned.
    #[error("worker thread could not be spawned: {0}")]
    SpawnFailed(String),

    /// `include()` was asked to run a streaming (async) command inline.
    #[error("cannot include a streaming command inline")]
    IncludeStreaming,
}

impl ErrorCode for EngineError {
    fn code(&self) -> &'static str {
        match self {
            Self::NoDestination => "ENGINE_NO_DESTINATION",
            Self::SurfaceClosed => "ENGINE_SURFACE_CLOSED",
            Self::CommandNotFound(_) => "ENGINE_COMMAND_NOT_FOUND",
            Self::SpawnFailed(_) => "ENGINE_SPAWN_FAILED",
            Self::IncludeStreaming => "ENGINE_INCLUDE_STREAMING",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::SpawnFailed(_))
    }
}

/// A failed command execution, ready for error-styled rendering.
///
/// Built from whatever actually went wrong: a body error (with its
/// source chain), a panic payload, or a validation failure. It is handed
/// to the channel context, which turns it into an error artifact for
/// the normal emission path.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionFailure {
    /// One-line failure message.
    pub message: String,
    /// Formatted detail: the error source chain, or the panic location
    /// text. Empty for validation failures.
    pub trace: String,
}

impl ExecutionFailure {
    /// Builds a failure from a command body error, formatting its
    /// source chain one cause per line.
    #[must_use]
    pub fn from_error(error: &BodyError) -> Self {
        let mut trace = String::new();
        let mut source = error.source();
        while let Some(cause) = source {
            trace.push_str(&format!("caused by: {cause}\n"));
            source = cause.source();
        }
        Self {
            message: error.to_string(),
            trace: trace.trim_end().to_string(),
        }
    }

    /// Builds a failure from a caught panic payload.
    #[must_use]
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "command panicked".to_string()
        };
        Self {
            message,
            trace: "panic in command body".to_string(),
        }
    }

    /// Builds a failure from a validation error.
    #[must_use]
    pub fn from_validation(error: &ValidationError) -> Self {
        Self {
            message: error.to_string(),
            trace: String::new(),
        }
    }
}

impl std::fmt::Display for ExecutionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.trace.is_empty() {
            write!(f, "ERROR: {}", self.message)
        } else {
            write!(f, "ERROR: {}\n{}", self.message, self.trace)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("outer failed")]
    struct Outer {
        #[source]
        inner: Inner,
    }

    #[derive(Debug, Error)]
    #[error("inner detail")]
    struct Inner;

    #[test]
    fn error_chain_is_formatted_cause_per_line() {
        let err: BodyError = Box::new(Outer { inner: Inner });
        let failure = ExecutionFailure::from_error(&err);
        assert_eq!(failure.message, "outer failed");
        assert_eq!(failure.trace, "caused by: inner detail");
    }

    #[test]
    fn panic_payloads_are_extracted() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        let failure = ExecutionFailure::from_panic(payload.as_ref());
        assert_eq!(failure.message, "boom");
    }

    #[test]
    fn validation_failures_carry_no_trace() {
        let failure = ExecutionFailure::from_validation(&ValidationError::MissingParam {
            name: "name".into(),
        });
        assert!(failure.message.contains("'name'"));
        assert!(failure.trace.is_empty());
    }

    #[test]
    fn engine_error_codes() {
        assert_eq!(EngineError::NoDestination.code(), "ENGINE_NO_DESTINATION");
        assert!(!EngineError::NoDestination.is_recoverable());
        assert!(EngineError::SpawnFailed("x".into()).is_recoverable());
    }
}
