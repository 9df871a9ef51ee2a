//! Application layer for Janus.
//!
//! [`App`] wires the engine together for one application: a registry,
//! a coordinator, a journal and a surface, driven by an [`AppSpec`].
//! Frontends (the CLI, a widget host) construct an `App` with their
//! channel and surface, then work exclusively through command handles.
//!
//! # Example
//!
//! ```
//! use janus_app::App;
//! use janus_engine::{RecordingSurface, WidgetChannel};
//! use janus_spec::{AppSpec, CommandSpec};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let spec = AppSpec::new().with_command(CommandSpec::sync("status", |_| {
//!     janus_engine::emit("all good");
//!     Ok(None)
//! }));
//!
//! let surface = Arc::new(RecordingSurface::new());
//! let app = App::new(spec, WidgetChannel::new(), surface, tokio::runtime::Handle::current());
//! app.command("status").unwrap().run(Default::default());
//! # }
//! ```

mod error;

pub use error::AppError;

use janus_engine::{
    capture, ChannelContext, CommandHandle, Coordinator, Emitted, Journal, Router, RunHandle,
    State, Surface, SurfaceCommand, ViewRegistry,
};
use janus_spec::AppSpec;
use janus_types::ViewKey;
use std::sync::Arc;

/// A running Janus application on one channel.
pub struct App<C: ChannelContext> {
    spec: AppSpec,
    coordinator: Arc<Coordinator<C>>,
    installed_fallback: std::sync::atomic::AtomicBool,
}

impl<C: ChannelContext> App<C> {
    /// Wires an application: fresh registry and journal, the given
    /// channel context and surface, and the runtime used for streaming
    /// commands.
    #[must_use]
    pub fn new(
        spec: AppSpec,
        ctx: C,
        surface: Arc<dyn Surface<C::Artifact>>,
        runtime: tokio::runtime::Handle,
    ) -> Self {
        let router = Router::new(Arc::new(ctx), ViewRegistry::new(), surface);
        let coordinator = Arc::new(Coordinator::new(router, Journal::new(), runtime));
        Self {
            spec,
            coordinator,
            installed_fallback: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Returns the application spec.
    #[must_use]
    pub fn spec(&self) -> &AppSpec {
        &self.spec
    }

    /// Returns the journal.
    #[must_use]
    pub fn journal(&self) -> &Journal {
        self.coordinator.journal()
    }

    /// Returns the view registry.
    #[must_use]
    pub fn registry(&self) -> &ViewRegistry<C::Artifact> {
        self.coordinator.router().registry()
    }

    /// Looks up a command by name.
    ///
    /// Qualified names (`group:command`) address a group directly;
    /// unqualified names resolve against the selected command's group
    /// first, then against root commands, so a command inside a group
    /// can reach its siblings without qualification.
    ///
    /// # Errors
    ///
    /// [`AppError::CommandNotFound`] when nothing matches.
    pub fn command(&self, name: &str) -> Result<CommandHandle<C>, AppError> {
        let key = self.resolve_key(name)?;
        let spec = self
            .spec
            .find(&key)
            .ok_or_else(|| AppError::CommandNotFound(name.to_string()))?;
        Ok(CommandHandle::new(
            self.coordinator.clone(),
            key,
            spec.clone(),
        ))
    }

    fn resolve_key(&self, name: &str) -> Result<ViewKey, AppError> {
        if name.contains(':') {
            let key = ViewKey::parse(name);
            return if self.spec.find(&key).is_some() {
                Ok(key)
            } else {
                Err(AppError::CommandNotFound(name.to_string()))
            };
        }

        // Sibling lookup inside the selected group first.
        if let Some(selected) = self.registry().selected() {
            if let Some(group) = selected.group {
                let candidate = ViewKey::grouped(group, name);
                if self.spec.find(&candidate).is_some() {
                    return Ok(candidate);
                }
            }
        }

        let root = ViewKey::root(name);
        if self.spec.find(&root).is_some() {
            Ok(root)
        } else {
            Err(AppError::CommandNotFound(name.to_string()))
        }
    }

    /// Returns a handle to the currently selected command.
    #[must_use]
    pub fn current_command(&self) -> Option<CommandHandle<C>> {
        let key = self.registry().selected()?;
        let spec = self.spec.find(&key)?;
        Some(CommandHandle::new(
            self.coordinator.clone(),
            key,
            spec.clone(),
        ))
    }

    /// Returns handles for every command, root commands first, in
    /// display order.
    #[must_use]
    pub fn commands(&self) -> Vec<CommandHandle<C>> {
        let mut handles = Vec::new();
        for command in &self.spec.commands {
            handles.push(CommandHandle::new(
                self.coordinator.clone(),
                ViewKey::root(command.name.as_str()),
                command.clone(),
            ));
        }
        for group in &self.spec.groups {
            for command in &group.commands {
                handles.push(CommandHandle::new(
                    self.coordinator.clone(),
                    ViewKey::grouped(group.name.as_str(), command.name.as_str()),
                    command.clone(),
                ));
            }
        }
        handles
    }

    /// Selects a command by name.
    ///
    /// # Errors
    ///
    /// [`AppError::CommandNotFound`] when nothing matches.
    pub fn select(&self, name: &str) -> Result<Option<RunHandle>, AppError> {
        Ok(self.command(name)?.select())
    }

    /// Selects the first command, the way a fresh screen does.
    ///
    /// # Errors
    ///
    /// [`AppError::CommandNotFound`] for an empty spec.
    pub fn select_first(&self) -> Result<Option<RunHandle>, AppError> {
        let key = self
            .spec
            .first_key()
            .ok_or_else(|| AppError::CommandNotFound("<first>".to_string()))?;
        Ok(self.select(&key.qualified())?)
    }

    /// Copies text to the clipboard through the surface, with a
    /// confirmation emission on the widget channel (the text channel's
    /// surface prints the copy itself).
    pub fn clipboard(&self, text: impl Into<String>) {
        let router = self.coordinator.router();
        router.submit(SurfaceCommand::Clipboard { text: text.into() });
        if router.ctx().name() == "widget" {
            if let Err(err) = router.immediate(Emitted::plain("✓ Copied to clipboard")) {
                tracing::debug!("clipboard confirmation dropped: {err}");
            }
        }
    }

    /// Presents an overlay/alert message through the surface.
    pub fn overlay(&self, message: impl Into<String>) {
        self.coordinator.router().submit(SurfaceCommand::Overlay {
            message: message.into(),
        });
    }

    /// Creates a reactive state value.
    #[must_use]
    pub fn state<T: Clone + PartialEq + Send + 'static>(&self, initial: T) -> State<T> {
        State::new(initial)
    }

    /// Installs this application as the immediate-output path for
    /// emissions outside any capture scope (process-global; one
    /// application per process).
    pub fn enable_immediate_output(&self) {
        let router = self.coordinator.router().clone();
        self.installed_fallback
            .store(true, std::sync::atomic::Ordering::SeqCst);
        capture::install_fallback(move |item| {
            if let Err(err) = router.immediate(item) {
                tracing::error!("immediate emission lost: {err}");
            }
        });
    }
}

impl<C: ChannelContext> Drop for App<C> {
    fn drop(&mut self) {
        // The fallback holds a router over this app's registry; a
        // dangling one would route into a dead application.
        if self
            .installed_fallback
            .load(std::sync::atomic::Ordering::SeqCst)
        {
            capture::clear_fallback();
        }
    }
}
