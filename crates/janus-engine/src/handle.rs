//! Command handles - the application-layer API for one command.
//!
//! A [`CommandHandle`] wraps one command and its view key. It is the
//! unit application code passes around: select it, run it, include it
//! inline, read the last run's result or captured text.

use crate::channel::ChannelContext;
use crate::coordinator::{Coordinator, RunHandle};
use crate::registry::RunState;
use crate::surface::SurfaceCommand;
use janus_spec::{BodyError, CommandSpec, ParamMap};
use janus_types::ViewKey;
use std::sync::Arc;

/// Handle to one command of a running application.
pub struct CommandHandle<C: ChannelContext> {
    key: ViewKey,
    spec: CommandSpec,
    coordinator: Arc<Coordinator<C>>,
}

impl<C: ChannelContext> std::fmt::Debug for CommandHandle<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandHandle")
            .field("key", &self.key)
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

impl<C: ChannelContext> Clone for CommandHandle<C> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            spec: self.spec.clone(),
            coordinator: self.coordinator.clone(),
        }
    }
}

impl<C: ChannelContext> CommandHandle<C> {
    /// Creates a handle. Application wiring resolves the spec and key.
    #[must_use]
    pub fn new(coordinator: Arc<Coordinator<C>>, key: ViewKey, spec: CommandSpec) -> Self {
        Self {
            key,
            spec,
            coordinator,
        }
    }

    /// Returns the command's view key.
    #[must_use]
    pub fn key(&self) -> &ViewKey {
        &self.key
    }

    /// Returns the command's spec.
    #[must_use]
    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    /// Selects this command on screen. Returns the run handle when the
    /// selection auto-ran the command.
    pub fn select(&self) -> Option<RunHandle> {
        self.coordinator.select(&self.key, &self.spec)
    }

    /// Selects this command, then executes it with `params`, routing
    /// output to the command's own view.
    pub fn run(&self, params: ParamMap) -> RunHandle {
        if let Some(auto) = self.coordinator.select(&self.key, &self.spec) {
            if params.is_empty() {
                return auto;
            }
        }
        self.coordinator.dispatch(&self.key, &self.spec, params)
    }

    /// Executes this command inline: emissions append into the
    /// caller's current capture scope rather than a fresh view.
    ///
    /// # Errors
    ///
    /// Propagates the body's error; validation failures and panics are
    /// converted. Streaming commands cannot run inline.
    pub fn include(&self, params: ParamMap) -> Result<Option<serde_json::Value>, BodyError> {
        self.coordinator.include(&self.key, &self.spec, params)
    }

    /// Returns the last run's result value.
    #[must_use]
    pub fn result(&self) -> Option<serde_json::Value> {
        self.coordinator.router().registry().result(&self.key)
    }

    /// Returns the last run's captured text.
    #[must_use]
    pub fn captured_text(&self) -> String {
        self.coordinator.router().registry().captured_text(&self.key)
    }

    /// Returns the last run's lifecycle state.
    #[must_use]
    pub fn state(&self) -> RunState {
        self.coordinator.router().registry().state(&self.key)
    }

    /// Clears this command's displayed output. A running worker is not
    /// stopped; only the display is cleared. Auto-run commands re-run
    /// after clearing, matching selection behaviour.
    pub fn clear(&self) -> Option<RunHandle> {
        let router = self.coordinator.router();
        router.registry().clear(&self.key);
        router.submit(SurfaceCommand::Clear {
            key: self.key.clone(),
        });
        if self.spec.display.auto_run && !router.registry().is_running(&self.key) {
            return Some(
                self.coordinator
                    .dispatch(&self.key, &self.spec, ParamMap::new()),
            );
        }
        None
    }
}
