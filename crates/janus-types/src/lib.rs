//! Core types for Janus.
//!
//! This crate provides the foundational identifier and contract types
//! shared by every layer of the Janus workspace.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Contract Layer                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  janus-types  : ViewKey, region/cell ids, ErrorCode  ◄── HERE│
//! │  janus-spec   : CommandSpec, params, display options        │
//! │  janus-blocks : Block tree, Emitted union, coercion         │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Engine Layer                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  janus-engine : capture, channels, registry, coordinator    │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Frontend Layer                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  janus-app    : application wiring                          │
//! │  janus-cli    : command-line frontend                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here is plain data with stable serde representations so
//! that view keys and identities can cross thread and task boundaries
//! (and, eventually, process boundaries) without translation.

mod error;
mod id;
mod key;

pub use error::ErrorCode;
pub use id::{CellId, RegionId, StreamId};
pub use key::ViewKey;
