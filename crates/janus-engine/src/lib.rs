//! Janus capture-and-render engine.
//!
//! Command functions emit UI content through one call, [`emit`], and
//! the engine presents it faithfully through two unrelated channels: a
//! line-oriented text channel and a retained-widget channel. Command
//! authors write no channel-specific code.
//!
//! # Architecture
//!
//! ```text
//! command body ──emit()──► CaptureStack (task/thread-scoped, nested)
//!                              │
//!                              ▼
//!                    Router::resolve (five cases,
//!                    shared by both channels)
//!                              │
//!               ┌──────────────┴──────────────┐
//!               ▼                             ▼
//!         TextChannel                   WidgetChannel
//!         (TextArtifact)                (Widget tree)
//!               │                             │
//!               └──────────────┬──────────────┘
//!                              ▼
//!                    ViewRegistry (model, keyed by
//!                    (group, command), coalescing)
//!                              │
//!                              ▼
//!                    Surface port ── mpsc ──► surface owner
//! ```
//!
//! The [`Coordinator`] drives one invocation end to end: validation,
//! one of three execution modes (buffered-sync, streaming-async,
//! streaming-threaded), error conversion, and routing to the view that
//! originated the run, even when the user has switched away.
//!
//! Reactive updates flow the other way: a [`State`] change re-runs the
//! bound renderer inside a fresh capture scope and replaces exactly one
//! region in place, keyed by the region's stable identity.
//!
//! # Module Map
//!
//! - [`capture`](mod@capture) - emission capture, scoped stacks, `emit`
//! - [`channel`](mod@channel) - resolution contract + both channels
//! - `state` - observable values
//! - `registry` - per-command output destinations
//! - `surface` - marshaled display mutation
//! - `coordinator` - the three execution modes
//! - `journal` - run lifecycle log
//! - `handle` - per-command application API

pub mod capture;
pub mod channel;
mod coordinator;
mod error;
mod handle;
mod journal;
mod registry;
mod state;
mod surface;

pub use capture::{
    active_stack, clear_fallback, current_view, emit, emit_text, install_fallback, push_scope,
    push_view, try_emit, CaptureStack, EmitWriter, ScopeGuard, ViewGuard,
};
pub use channel::{
    Artifact, ChannelContext, ConsoleRenderer, Router, TextArtifact, TextChannel, Widget,
    WidgetChannel,
};
pub use coordinator::{Coordinator, RunHandle};
pub use error::{EngineError, ExecutionFailure};
pub use handle::CommandHandle;
pub use journal::{Journal, JournalEntry, JournalKind};
pub use registry::{OutputCell, RouteEffect, RunRecord, RunState, ViewRegistry};
pub use state::State;
pub use surface::{
    surface_port, RecordingSurface, Surface, SurfaceCommand, SurfacePort, SurfaceReceiver,
};

// The content vocabulary is re-exported so application code depends on
// one crate.
pub use janus_blocks::{bind, coerce, Block, BlockKind, Coerced, Emitted, Observable, ObserverId};
