//! Per-command display and execution options.
//!
//! Display options are a static property of the command: the engine
//! reads them once at dispatch time and never re-evaluates them during
//! a run. The concurrency mode in particular is decided *before*
//! invocation, never inferred from runtime behaviour.

use std::sync::Arc;

/// How a command body is executed and how its output is flushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrencyMode {
    /// Run to completion on the caller's thread; display updates flush
    /// after the call returns.
    Buffered,
    /// Run as a suspending computation on the async runtime; every
    /// emission flushes immediately.
    Streaming,
    /// Run on a dedicated background worker thread; emissions flush
    /// immediately, display mutation is marshaled to the surface owner.
    Threaded,
}

impl std::fmt::Display for ConcurrencyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Buffered => "buffered",
            Self::Streaming => "streaming",
            Self::Threaded => "threaded",
        };
        write!(f, "{name}")
    }
}

/// Callback invoked when a command is selected on screen.
#[derive(Clone)]
pub struct SelectHook(Arc<dyn Fn() + Send + Sync>);

impl SelectHook {
    /// Wraps a callback.
    #[must_use]
    pub fn new(hook: impl Fn() + Send + Sync + 'static) -> Self {
        Self(Arc::new(hook))
    }

    /// Invokes the callback.
    pub fn call(&self) {
        (self.0)();
    }
}

impl std::fmt::Debug for SelectHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SelectHook")
    }
}

/// Display and behaviour options for one command.
///
/// Defaults match an ordinary form-driven command: shown as a text
/// entry (not a button), buffered execution, manual run with a
/// "Run Command" submit control, header shown, auto-scroll on.
#[derive(Debug, Clone)]
pub struct DisplayOptions {
    /// Present the command as a button in the navigation chrome.
    pub button: bool,
    /// Execution/flush mode; see [`ConcurrencyMode`].
    pub mode: ConcurrencyMode,
    /// Run automatically on first selection and hide the submit control.
    pub auto_run: bool,
    /// Show the command name and description above the form.
    pub header: bool,
    /// Label of the submit control.
    pub submit_label: String,
    /// Scroll the output destination to its end as artifacts arrive.
    pub auto_scroll: bool,
    /// Present the form and output in a modal overlay.
    pub modal: bool,
    /// Invoked when the command is selected.
    pub on_select: Option<SelectHook>,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            button: false,
            mode: ConcurrencyMode::Buffered,
            auto_run: false,
            header: true,
            submit_label: "Run Command".to_string(),
            auto_scroll: true,
            modal: false,
            on_select: None,
        }
    }
}

impl DisplayOptions {
    /// Options for a dashboard-style view: auto-run, no header, no
    /// auto-scroll.
    #[must_use]
    pub fn view() -> Self {
        Self {
            auto_run: true,
            header: false,
            auto_scroll: false,
            ..Self::default()
        }
    }

    /// Presents the command as a button.
    #[must_use]
    pub fn as_button(mut self) -> Self {
        self.button = true;
        self
    }

    /// Sets the concurrency mode.
    #[must_use]
    pub fn with_mode(mut self, mode: ConcurrencyMode) -> Self {
        self.mode = mode;
        self
    }

    /// Runs the command automatically on first selection.
    #[must_use]
    pub fn auto_run(mut self) -> Self {
        self.auto_run = true;
        self
    }

    /// Hides the command header.
    #[must_use]
    pub fn without_header(mut self) -> Self {
        self.header = false;
        self
    }

    /// Sets the submit control label.
    #[must_use]
    pub fn with_submit_label(mut self, label: impl Into<String>) -> Self {
        self.submit_label = label.into();
        self
    }

    /// Disables auto-scroll.
    #[must_use]
    pub fn without_auto_scroll(mut self) -> Self {
        self.auto_scroll = false;
        self
    }

    /// Presents the command modally.
    #[must_use]
    pub fn modal(mut self) -> Self {
        self.modal = true;
        self
    }

    /// Sets the selection callback.
    #[must_use]
    pub fn on_select(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_select = Some(SelectHook::new(hook));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_plain_buffered_form() {
        let opts = DisplayOptions::default();
        assert!(!opts.button);
        assert_eq!(opts.mode, ConcurrencyMode::Buffered);
        assert!(!opts.auto_run);
        assert!(opts.header);
        assert_eq!(opts.submit_label, "Run Command");
        assert!(opts.auto_scroll);
        assert!(!opts.modal);
    }

    #[test]
    fn view_preset_overrides_presentation_flags() {
        let opts = DisplayOptions::view();
        assert!(opts.auto_run);
        assert!(!opts.header);
        assert!(!opts.auto_scroll);
        assert_eq!(opts.mode, ConcurrencyMode::Buffered);
    }
}
