//! Emission capture - stacks, scoped activation, and the `emit` entry
//! point.
//!
//! During a command's dynamic extent, every `emit()` appends to the
//! *active* capture stack. Activation is scoped and nests as a stack of
//! stacks: entering a scope activates a fresh stack; leaving it (on
//! any exit path, including panics) restores the previous one.
//!
//! # Where the active stack lives
//!
//! There is no single global pointer. The scope stack is addressed
//! through execution-local storage, matching the three execution modes:
//!
//! - async tasks carry it in `tokio::task_local!` storage, so it
//!   survives suspension and resumption;
//! - plain threads (buffered callers, background workers) carry it in
//!   `thread_local!` storage.
//!
//! `emit()` consults task-local storage first, then thread-local. With
//! no active stack anywhere, the installed immediate-output fallback
//! runs; with no fallback either, the emission is a routing defect and
//! is reported loudly.
//!
//! # Streaming
//!
//! A stack delivers appended items to a registered observer as they
//! occur; this is how streaming modes flush immediately and how a
//! dynamic producer keeps appending live children after its first pass.

use crate::EngineError;
use janus_blocks::Emitted;
use janus_types::ViewKey;
use parking_lot::{Mutex, RwLock};
use std::cell::RefCell;
use std::io;
use std::sync::Arc;

/// An ordered, appendable emission buffer with an append observer.
///
/// Cloning is cheap and shares the buffer. A producer that wants to
/// keep emitting after its capture scope closed (a dynamic callable's
/// background work, for instance) clones the handle out of
/// [`active_stack`] while its scope is still open.
#[derive(Clone)]
pub struct CaptureStack {
    inner: Arc<StackInner>,
}

struct StackInner {
    items: Mutex<Vec<Emitted>>,
    observer: Mutex<Option<Box<dyn FnMut(Emitted) + Send>>>,
}

impl CaptureStack {
    /// Creates an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StackInner {
                items: Mutex::new(Vec::new()),
                observer: Mutex::new(None),
            }),
        }
    }

    /// Appends an item.
    ///
    /// With an observer registered the item is handed to it instead of
    /// being buffered; delivery happens as the append occurs, not when
    /// the scope closes. The observer must not append back into the
    /// same stack.
    pub fn append(&self, item: Emitted) {
        let mut observer = self.inner.observer.lock();
        match observer.as_mut() {
            Some(sink) => sink(item),
            None => self.inner.items.lock().push(item),
        }
    }

    /// Registers the append observer.
    ///
    /// Any already-buffered backlog is delivered to the observer first,
    /// atomically with registration, so a producer racing the
    /// registration cannot slip an item past it.
    pub fn register_observer(&self, mut sink: impl FnMut(Emitted) + Send + 'static) {
        let mut observer = self.inner.observer.lock();
        for item in self.inner.items.lock().drain(..) {
            sink(item);
        }
        *observer = Some(Box::new(sink));
    }

    /// Drains and returns the buffered items, in emission order.
    #[must_use]
    pub fn drain(&self) -> Vec<Emitted> {
        std::mem::take(&mut *self.inner.items.lock())
    }

    /// Returns the number of buffered items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.items.lock().len()
    }

    /// Returns `true` if no items are buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CaptureStack {
    fn default() -> Self {
        Self::new()
    }
}

thread_local! {
    static THREAD_SCOPES: RefCell<Vec<CaptureStack>> = const { RefCell::new(Vec::new()) };
    static THREAD_VIEWS: RefCell<Vec<ViewKey>> = const { RefCell::new(Vec::new()) };
}

tokio::task_local! {
    /// Scope stack for async execution; installed by the coordinator
    /// for the whole body future so it survives suspension.
    pub(crate) static TASK_SCOPES: RefCell<Vec<CaptureStack>>;

    /// Originating command for async execution.
    pub(crate) static TASK_VIEW: ViewKey;
}

/// Immediate-output fallback, installed by the hosting channel.
static FALLBACK: RwLock<Option<Arc<dyn Fn(Emitted) + Send + Sync>>> = RwLock::new(None);

/// Scoped activation of a capture stack.
///
/// Dropping the guard deactivates the stack and restores the previously
/// active one. Guards are strictly nested, so this holds on every exit
/// path including unwinding.
pub struct ScopeGuard {
    in_task: bool,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if self.in_task {
            let _ = TASK_SCOPES.try_with(|scopes| scopes.borrow_mut().pop());
        } else {
            THREAD_SCOPES.with(|scopes| scopes.borrow_mut().pop());
        }
    }
}

/// Activates `stack` for the current thread-of-control.
///
/// Inside an async task (with task-local storage installed) the scope
/// nests in the task's storage; otherwise in the current thread's.
#[must_use]
pub fn push_scope(stack: CaptureStack) -> ScopeGuard {
    let in_task = TASK_SCOPES
        .try_with(|scopes| scopes.borrow_mut().push(stack.clone()))
        .is_ok();
    if !in_task {
        THREAD_SCOPES.with(|scopes| scopes.borrow_mut().push(stack));
    }
    ScopeGuard { in_task }
}

/// Returns the currently active capture stack, if any.
#[must_use]
pub fn active_stack() -> Option<CaptureStack> {
    if let Ok(Some(stack)) = TASK_SCOPES.try_with(|scopes| scopes.borrow().last().cloned()) {
        return Some(stack);
    }
    THREAD_SCOPES.with(|scopes| scopes.borrow().last().cloned())
}

/// Scoped installation of the current command identity for a thread.
///
/// Background workers (and buffered callers) install the originating
/// command here so emissions route to its view even after the user has
/// switched the visible command.
pub struct ViewGuard {
    _private: (),
}

impl Drop for ViewGuard {
    fn drop(&mut self) {
        THREAD_VIEWS.with(|views| {
            views.borrow_mut().pop();
        });
    }
}

/// Installs `key` as the current command for this thread.
#[must_use]
pub fn push_view(key: ViewKey) -> ViewGuard {
    THREAD_VIEWS.with(|views| views.borrow_mut().push(key));
    ViewGuard { _private: () }
}

/// Resolves the currently executing command.
///
/// Priority: async-task-scoped value, then thread-scoped value. The
/// caller supplies the final fallback (the registry's selected
/// command). Three modes can emit concurrently against a UI that only
/// shows one selected command at a time, which is why the lookup is
/// layered.
#[must_use]
pub fn current_view() -> Option<ViewKey> {
    if let Ok(key) = TASK_VIEW.try_with(Clone::clone) {
        return Some(key);
    }
    THREAD_VIEWS.with(|views| views.borrow().last().cloned())
}

/// Installs the immediate-output fallback for emissions outside any
/// capture scope. The hosting channel decides what "immediate" means;
/// the text channel renders and prints directly.
pub fn install_fallback(fallback: impl Fn(Emitted) + Send + Sync + 'static) {
    *FALLBACK.write() = Some(Arc::new(fallback));
}

/// Removes the installed fallback.
pub fn clear_fallback() {
    *FALLBACK.write() = None;
}

/// Emits one item of UI content.
///
/// Appends to the active capture stack; outside any scope, delegates to
/// the installed immediate-output fallback.
///
/// # Errors
///
/// [`EngineError::NoDestination`] when no scope is active and no
/// fallback is installed. This is a broken capture-scope invariant.
pub fn try_emit(item: impl Into<Emitted>) -> Result<(), EngineError> {
    let item = item.into();
    if let Some(stack) = active_stack() {
        stack.append(item);
        return Ok(());
    }
    let fallback = FALLBACK.read().clone();
    match fallback {
        Some(f) => {
            f(item);
            Ok(())
        }
        None => Err(EngineError::NoDestination),
    }
}

/// Emits one item of UI content.
///
/// Like [`try_emit`], but a routing defect is reported through the
/// developer console (`tracing::error`) instead of a return value;
/// command bodies should not have to thread `Result`s through plain
/// output calls.
pub fn emit(item: impl Into<Emitted>) {
    if let Err(err) = try_emit(item) {
        tracing::error!(
            code = "ENGINE_NO_DESTINATION",
            "emit() outside any capture scope with no immediate-output fallback: {err}"
        );
    }
}

/// Emits plain text (not markup). Consecutive plain-text emissions
/// coalesce into one accumulated block at the destination.
pub fn emit_text(value: impl std::fmt::Display) {
    emit(Emitted::plain(value.to_string()));
}

/// An [`io::Write`] adapter that turns written lines into plain-text
/// emissions.
///
/// The standard-output-like side channel of a command: bytes are
/// line-buffered, and each complete line becomes one plain-text
/// emission as it is produced. Dropping the writer flushes any partial
/// final line.
///
/// # Example
///
/// ```no_run
/// use std::io::Write;
///
/// let mut out = janus_engine::EmitWriter::new();
/// writeln!(out, "step 1").unwrap();
/// writeln!(out, "step 2").unwrap();
/// ```
#[derive(Default)]
pub struct EmitWriter {
    buffer: String,
}

impl EmitWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl io::Write for EmitWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.push_str(&String::from_utf8_lossy(buf));
        while let Some(newline) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline).collect();
            emit(Emitted::plain(line.trim_end_matches('\n')));
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.buffer.is_empty() {
            emit(Emitted::plain(std::mem::take(&mut self.buffer)));
        }
        Ok(())
    }
}

impl Drop for EmitWriter {
    fn drop(&mut self) {
        let _ = io::Write::flush(self);
    }
}
