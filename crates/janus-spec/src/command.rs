//! Command and application specifications.
//!
//! A [`CommandSpec`] couples a name, a parameter list, display options
//! and the command body. The body is opaque to the engine: a sync
//! closure or an async closure returning an optional JSON value. A
//! returned value is treated as one final emission by the coordinator,
//! and is also retained as the run's result.

use crate::{ConcurrencyMode, DisplayOptions, ParamMap, ParamSpec};
use janus_types::ViewKey;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Error type command bodies may fail with.
pub type BodyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result of a command body: an optional value to emit and retain.
pub type BodyResult = Result<Option<serde_json::Value>, BodyError>;

/// Future returned by async command bodies.
pub type BodyFuture = Pin<Box<dyn Future<Output = BodyResult> + Send>>;

/// Shared synchronous command body.
pub type SyncBody = Arc<dyn Fn(&ParamMap) -> BodyResult + Send + Sync>;

/// Shared asynchronous command body.
pub type AsyncBody = Arc<dyn Fn(ParamMap) -> BodyFuture + Send + Sync>;

/// The executable body of a command.
///
/// The variant is a static property: sync bodies run buffered (or
/// threaded, when the display options ask for it), async bodies run
/// streaming on the async runtime.
#[derive(Clone)]
pub enum CommandBody {
    /// Synchronous body, invoked with resolved parameters.
    Sync(SyncBody),
    /// Asynchronous body, invoked with resolved parameters.
    Async(AsyncBody),
}

impl std::fmt::Debug for CommandBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("CommandBody::Sync"),
            Self::Async(_) => f.write_str("CommandBody::Async"),
        }
    }
}

/// Specification for one command.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// Command name (unique within its group).
    pub name: String,
    /// One-line help text.
    pub help: Option<String>,
    /// Parameter list, in form order.
    pub params: Vec<ParamSpec>,
    /// Display and behaviour options.
    pub display: DisplayOptions,
    /// The executable body.
    pub body: CommandBody,
}

impl CommandSpec {
    /// Creates a command with a synchronous body (buffered mode).
    #[must_use]
    pub fn sync(
        name: impl Into<String>,
        body: impl Fn(&ParamMap) -> BodyResult + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            help: None,
            params: Vec::new(),
            display: DisplayOptions::default(),
            body: CommandBody::Sync(Arc::new(body)),
        }
    }

    /// Creates a command with a synchronous body run on a background
    /// worker thread (threaded mode).
    #[must_use]
    pub fn threaded(
        name: impl Into<String>,
        body: impl Fn(&ParamMap) -> BodyResult + Send + Sync + 'static,
    ) -> Self {
        let mut spec = Self::sync(name, body);
        spec.display.mode = ConcurrencyMode::Threaded;
        spec
    }

    /// Creates a command with an asynchronous body (streaming mode).
    #[must_use]
    pub fn streaming<F, Fut>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(ParamMap) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = BodyResult> + Send + 'static,
    {
        Self {
            name: name.into(),
            help: None,
            params: Vec::new(),
            display: DisplayOptions::default().with_mode(ConcurrencyMode::Streaming),
            body: CommandBody::Async(Arc::new(move |params| Box::pin(body(params)))),
        }
    }

    /// Sets the help text.
    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Appends a parameter.
    #[must_use]
    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Replaces the display options. The concurrency mode is still
    /// reconciled with the body kind by [`effective_mode`](Self::effective_mode).
    #[must_use]
    pub fn with_display(mut self, display: DisplayOptions) -> Self {
        self.display = display;
        self
    }

    /// Returns the mode this command actually executes in.
    ///
    /// Async bodies always stream. Sync bodies run threaded when the
    /// display options ask for it, buffered otherwise; a sync body
    /// cannot stream cooperatively.
    #[must_use]
    pub fn effective_mode(&self) -> ConcurrencyMode {
        match (&self.body, self.display.mode) {
            (CommandBody::Async(_), _) => ConcurrencyMode::Streaming,
            (CommandBody::Sync(_), ConcurrencyMode::Threaded) => ConcurrencyMode::Threaded,
            (CommandBody::Sync(_), _) => ConcurrencyMode::Buffered,
        }
    }
}

/// A named group of commands (the original's sub-applications).
#[derive(Debug, Clone, Default)]
pub struct GroupSpec {
    /// Group name, used as the qualifier in `group:command` lookups.
    pub name: String,
    /// Commands in this group, in display order.
    pub commands: Vec<CommandSpec>,
}

impl GroupSpec {
    /// Creates an empty group.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: Vec::new(),
        }
    }

    /// Appends a command to the group.
    #[must_use]
    pub fn with_command(mut self, command: CommandSpec) -> Self {
        self.commands.push(command);
        self
    }
}

/// Specification for the entire application.
#[derive(Debug, Clone, Default)]
pub struct AppSpec {
    /// Application title.
    pub title: Option<String>,
    /// Application description.
    pub description: Option<String>,
    /// Root commands, in display order.
    pub commands: Vec<CommandSpec>,
    /// Command groups, in display order.
    pub groups: Vec<GroupSpec>,
}

impl AppSpec {
    /// Creates an empty application spec.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Appends a root command.
    #[must_use]
    pub fn with_command(mut self, command: CommandSpec) -> Self {
        self.commands.push(command);
        self
    }

    /// Appends a command group.
    #[must_use]
    pub fn with_group(mut self, group: GroupSpec) -> Self {
        self.groups.push(group);
        self
    }

    /// Looks up a command by view key.
    #[must_use]
    pub fn find(&self, key: &ViewKey) -> Option<&CommandSpec> {
        match &key.group {
            None => self.commands.iter().find(|c| c.name == key.command),
            Some(group) => self
                .groups
                .iter()
                .find(|g| &g.name == group)?
                .commands
                .iter()
                .find(|c| c.name == key.command),
        }
    }

    /// Returns the view key of the first command, if any.
    #[must_use]
    pub fn first_key(&self) -> Option<ViewKey> {
        if let Some(first) = self.commands.first() {
            return Some(ViewKey::root(first.name.as_str()));
        }
        self.groups.iter().find_map(|g| {
            g.commands
                .first()
                .map(|c| ViewKey::grouped(g.name.as_str(), c.name.as_str()))
        })
    }
}
