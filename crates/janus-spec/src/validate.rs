//! Parameter validation.
//!
//! Validation runs before a command body does. A failed validation is
//! reported through the normal emission path by the coordinator; the
//! run terminates in the `Validating` phase and never reaches `Running`.
//!
//! # Error Codes
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`ValidationError::MissingParam`] | `SPEC_MISSING_PARAM` | Yes |
//! | [`ValidationError::TypeMismatch`] | `SPEC_TYPE_MISMATCH` | Yes |
//! | [`ValidationError::InvalidChoice`] | `SPEC_INVALID_CHOICE` | Yes |
//! | [`ValidationError::UnknownParam`] | `SPEC_UNKNOWN_PARAM` | Yes |
//!
//! All validation errors are recoverable: the user fixes the form and
//! submits again.

use crate::{CommandSpec, ParamMap, ParamType, ParamValue};
use janus_types::ErrorCode;
use thiserror::Error;

/// A parameter validation failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required parameter has no supplied value and no default.
    #[error("required parameter '{name}' is missing")]
    MissingParam {
        /// Parameter name.
        name: String,
    },

    /// A supplied value does not match the declared type.
    #[error("parameter '{name}' expects {expected}")]
    TypeMismatch {
        /// Parameter name.
        name: String,
        /// Declared type.
        expected: ParamType,
    },

    /// A choice value is not one of the allowed choices.
    #[error("parameter '{name}': '{value}' is not one of {allowed:?}")]
    InvalidChoice {
        /// Parameter name.
        name: String,
        /// Supplied value.
        value: String,
        /// Allowed choices.
        allowed: Vec<String>,
    },

    /// A supplied name is not declared by the command.
    #[error("unknown parameter '{name}'")]
    UnknownParam {
        /// Supplied name.
        name: String,
    },
}

impl ErrorCode for ValidationError {
    fn code(&self) -> &'static str {
        match self {
            Self::MissingParam { .. } => "SPEC_MISSING_PARAM",
            Self::TypeMismatch { .. } => "SPEC_TYPE_MISMATCH",
            Self::InvalidChoice { .. } => "SPEC_INVALID_CHOICE",
            Self::UnknownParam { .. } => "SPEC_UNKNOWN_PARAM",
        }
    }

    fn is_recoverable(&self) -> bool {
        true
    }
}

/// Validates supplied parameters against a command spec.
///
/// Returns every failure, not just the first: a form highlights all
/// problems in one pass.
#[must_use]
pub fn validate(spec: &CommandSpec, supplied: &ParamMap) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for param in &spec.params {
        match supplied.get(&param.name) {
            None => {
                if param.required && param.default.is_none() {
                    errors.push(ValidationError::MissingParam {
                        name: param.name.clone(),
                    });
                }
            }
            Some(value) => {
                if !value.matches(param.param_type) {
                    errors.push(ValidationError::TypeMismatch {
                        name: param.name.clone(),
                        expected: param.param_type,
                    });
                    continue;
                }
                if param.param_type == ParamType::Choice {
                    let allowed = param.choices.clone().unwrap_or_default();
                    if let Some(v) = value.as_str() {
                        if !allowed.iter().any(|c| c == v) {
                            errors.push(ValidationError::InvalidChoice {
                                name: param.name.clone(),
                                value: v.to_string(),
                                allowed,
                            });
                        }
                    }
                }
            }
        }
    }

    for name in supplied.keys() {
        if !spec.params.iter().any(|p| &p.name == name) {
            errors.push(ValidationError::UnknownParam { name: name.clone() });
        }
    }

    errors
}

/// Validates and resolves parameters, filling in declared defaults.
///
/// # Errors
///
/// Returns every validation failure when any check fails; the command
/// body must not run in that case.
pub fn resolve_params(
    spec: &CommandSpec,
    supplied: &ParamMap,
) -> Result<ParamMap, Vec<ValidationError>> {
    let errors = validate(spec, supplied);
    if !errors.is_empty() {
        return Err(errors);
    }

    let mut resolved = supplied.clone();
    for param in &spec.params {
        if !resolved.contains_key(&param.name) {
            if let Some(default) = &param.default {
                resolved.insert(param.name.clone(), default.clone());
            }
        }
    }
    Ok(resolved)
}
