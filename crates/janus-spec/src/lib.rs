//! Command and application specifications for Janus.
//!
//! This crate is the contract consumed from the reflection collaborator:
//! a [`CommandSpec`] describes one command (name, parameters, display
//! options, body), an [`AppSpec`] describes the whole application. The
//! engine never inspects user functions; it only reads these specs.
//!
//! # What lives here
//!
//! - [`ParamSpec`] / [`ParamType`] / [`ParamValue`]: the parameter
//!   list a form is generated from, and the values a form produces.
//! - [`DisplayOptions`] / [`ConcurrencyMode`]: per-command display and
//!   execution behaviour (show-as-button, buffered/streaming/threaded,
//!   auto-run-on-select, header, submit label, auto-scroll, modal).
//! - [`CommandSpec`] / [`GroupSpec`] / [`AppSpec`]: the command tree.
//! - [`validate`] / [`resolve_params`]: parameter validation. A failed
//!   validation never reaches execution; the engine reports it through
//!   the normal emission path.
//!
//! # Example
//!
//! ```
//! use janus_spec::{CommandSpec, ParamSpec, ParamValue};
//!
//! let spec = CommandSpec::sync("greet", |params| {
//!     let name = params.get("name").and_then(ParamValue::as_str).unwrap_or("world");
//!     Ok(Some(serde_json::json!(format!("hello {name}"))))
//! })
//! .with_help("Greet someone")
//! .with_param(ParamSpec::string("name").required());
//!
//! assert_eq!(spec.name, "greet");
//! ```

mod command;
mod display;
mod param;
mod validate;

pub use command::{
    AppSpec, AsyncBody, BodyError, BodyFuture, BodyResult, CommandBody, CommandSpec, GroupSpec,
    SyncBody,
};
pub use display::{ConcurrencyMode, DisplayOptions, SelectHook};
pub use param::{ParamMap, ParamSpec, ParamType, ParamValue};
pub use validate::{resolve_params, validate, ValidationError};
