//! Execution coordinator - one command invocation, end to end.
//!
//! The coordinator owns the invocation state machine
//! (`Idle → Validating → Running → {Succeeded | Failed} → Idle`) and
//! the three execution modes. Routing, error conversion and the
//! capture discipline are written once here; the modes differ only in
//! their flush policy and in how they carry the command identity:
//!
//! | Mode | Body | Flush | Identity |
//! |------|------|-------|----------|
//! | Buffered | sync | after the call returns | caller's thread scope |
//! | Streaming | async | immediately, per emission | task-local |
//! | Threaded | sync | immediately, marshaled | worker thread-local |
//!
//! A failed validation terminates before `Running` and is reported
//! through the normal emission path. A body error or panic is caught,
//! converted to an error-styled emission, and ends the run as
//! `Failed`; nothing propagates into the host loop.
//!
//! Threaded workers are daemonized: dispatch returns immediately, the
//! engine never joins them at shutdown, and in-flight work has no
//! cancellation primitive. The worker itself re-enables the run
//! control when it completes.

use crate::capture::{self, CaptureStack, TASK_SCOPES, TASK_VIEW};
use crate::channel::{ChannelContext, Router};
use crate::journal::{Journal, JournalKind};
use crate::registry::RunState;
use crate::surface::SurfaceCommand;
use crate::{EngineError, ExecutionFailure};
use janus_blocks::{Block, Emitted};
use janus_spec::{
    resolve_params, AsyncBody, BodyError, CommandBody, CommandSpec, ConcurrencyMode, ParamMap,
    SyncBody,
};
use janus_types::ViewKey;
use serde_json::json;
use std::cell::RefCell;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Handle for one dispatched invocation.
///
/// Buffered runs are already complete when the handle is returned.
/// Streaming and threaded runs continue in the background; [`wait`]
/// exists for callers (mostly tests) that need the outcome, but
/// nothing requires waiting: a threaded worker must not keep the host
/// alive.
///
/// [`wait`]: RunHandle::wait
pub struct RunHandle {
    key: ViewKey,
    kind: HandleKind,
}

enum HandleKind {
    Completed,
    Task(tokio::task::JoinHandle<()>),
    Thread(std::thread::JoinHandle<()>),
}

impl RunHandle {
    fn completed(key: ViewKey) -> Self {
        Self {
            key,
            kind: HandleKind::Completed,
        }
    }

    fn task(key: ViewKey, handle: tokio::task::JoinHandle<()>) -> Self {
        Self {
            key,
            kind: HandleKind::Task(handle),
        }
    }

    fn thread(key: ViewKey, handle: std::thread::JoinHandle<()>) -> Self {
        Self {
            key,
            kind: HandleKind::Thread(handle),
        }
    }

    /// The invocation's view key.
    #[must_use]
    pub fn key(&self) -> &ViewKey {
        &self.key
    }

    /// Returns `true` if the run already finished when dispatched.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self.kind, HandleKind::Completed)
    }

    /// Waits for the run to settle. Buffered runs return immediately.
    pub async fn wait(self) {
        match self.kind {
            HandleKind::Completed => {}
            HandleKind::Task(handle) => {
                let _ = handle.await;
            }
            HandleKind::Thread(handle) => {
                let _ = tokio::task::spawn_blocking(move || handle.join()).await;
            }
        }
    }
}

/// Orchestrates command invocations for one channel.
pub struct Coordinator<C: ChannelContext> {
    router: Router<C>,
    journal: Journal,
    runtime: tokio::runtime::Handle,
}

impl<C: ChannelContext> Coordinator<C> {
    /// Creates a coordinator.
    #[must_use]
    pub fn new(router: Router<C>, journal: Journal, runtime: tokio::runtime::Handle) -> Self {
        Self {
            router,
            journal,
            runtime,
        }
    }

    /// Returns the router.
    #[must_use]
    pub fn router(&self) -> &Router<C> {
        &self.router
    }

    /// Returns the journal.
    #[must_use]
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Selects a command: shows its view, hides the others, applies
    /// the selection side effects (hook, clear-on-select, auto-run).
    ///
    /// Entries are created lazily here on first selection. A
    /// still-running or threaded command keeps its accumulated output
    /// across selection changes; other commands start from a clean
    /// view. Auto-run fires only when the view is empty, so switching
    /// back to a threaded auto command does not restart it.
    pub fn select(&self, key: &ViewKey, spec: &CommandSpec) -> Option<RunHandle> {
        self.journal
            .record(key, JournalKind::Selected, serde_json::Value::Null);

        if let Some(hook) = &spec.display.on_select {
            let hook = hook.clone();
            if catch_unwind(AssertUnwindSafe(move || hook.call())).is_err() {
                tracing::warn!(%key, "on_select hook panicked");
            }
        }

        let registry = self.router.registry();
        registry.ensure_entry(key);
        for hidden in registry.select(key) {
            self.router.submit(SurfaceCommand::SetVisible {
                key: hidden,
                visible: false,
            });
        }
        self.router.submit(SurfaceCommand::SetVisible {
            key: key.clone(),
            visible: true,
        });

        let keeps_output =
            spec.effective_mode() == ConcurrencyMode::Threaded || registry.is_running(key);
        if !keeps_output && registry.cell_count(key) > 0 {
            registry.clear(key);
            self.router
                .submit(SurfaceCommand::Clear { key: key.clone() });
        }

        if spec.display.auto_run && registry.cell_count(key) == 0 && !registry.is_running(key) {
            return Some(self.dispatch(key, spec, ParamMap::new()));
        }
        None
    }

    /// Dispatches one invocation.
    ///
    /// Validation happens first; on failure the run ends `Failed`
    /// without executing, with one error emission per validation
    /// problem. Otherwise the body runs in the command's declared mode.
    pub fn dispatch(&self, key: &ViewKey, spec: &CommandSpec, supplied: ParamMap) -> RunHandle {
        let registry = self.router.registry();
        registry.ensure_entry(key);
        registry.set_state(key, RunState::Validating);

        let params = match resolve_params(spec, &supplied) {
            Ok(params) => params,
            Err(errors) => {
                for error in &errors {
                    self.router
                        .deliver_error(key, &ExecutionFailure::from_validation(error));
                }
                registry.set_state(key, RunState::Failed);
                self.journal.record(
                    key,
                    JournalKind::ValidationFailed,
                    json!({ "problems": errors.len() }),
                );
                return RunHandle::completed(key.clone());
            }
        };

        registry.set_state(key, RunState::Running);
        self.journal.record(
            key,
            JournalKind::Started,
            json!({ "mode": spec.effective_mode().to_string() }),
        );

        match (spec.effective_mode(), &spec.body) {
            (ConcurrencyMode::Buffered, CommandBody::Sync(body)) => {
                self.run_buffered(key, body.clone(), params, spec.display.auto_scroll)
            }
            (ConcurrencyMode::Streaming, CommandBody::Async(body)) => {
                self.run_streaming(key, body.clone(), params, spec.display.auto_scroll)
            }
            (ConcurrencyMode::Threaded, CommandBody::Sync(body)) => {
                self.run_threaded(key, body.clone(), params, spec.display.auto_scroll)
            }
            (mode, _) => {
                // effective_mode() reconciles mode and body kind, so
                // this arm means the command spec mutated mid-dispatch.
                tracing::error!(%key, %mode, "mode and body kind disagree");
                settle(
                    &self.router,
                    &self.journal,
                    key,
                    false,
                    Some(ExecutionFailure {
                        message: format!("mode {mode} does not match the command body"),
                        trace: String::new(),
                    }),
                );
                RunHandle::completed(key.clone())
            }
        }
    }

    /// Mode 1 - buffered-sync: the body runs to completion on the
    /// caller's thread; emissions are captured and flushed as a batch
    /// after the call returns.
    fn run_buffered(
        &self,
        key: &ViewKey,
        body: SyncBody,
        params: ParamMap,
        auto_scroll: bool,
    ) -> RunHandle {
        let stack = CaptureStack::new();
        let outcome = {
            let _scope = capture::push_scope(stack.clone());
            let _view = capture::push_view(key.clone());
            catch_unwind(AssertUnwindSafe(|| body(&params)))
        };

        let mut failure = None;
        match outcome {
            Ok(Ok(Some(value))) => {
                self.router.registry().set_result(key, value.clone());
                stack.append(Emitted::Value(value));
            }
            Ok(Ok(None)) => {}
            Ok(Err(error)) => failure = Some(ExecutionFailure::from_error(&error)),
            Err(payload) => failure = Some(ExecutionFailure::from_panic(payload.as_ref())),
        }

        let root = Block::column([]);
        for item in stack.drain() {
            self.router.resolve_and_deliver(key, &root, item);
        }
        settle(&self.router, &self.journal, key, auto_scroll, failure);
        RunHandle::completed(key.clone())
    }

    /// Mode 2 - streaming-async: the body is a suspending computation;
    /// every emission flushes immediately, and the command identity
    /// rides in task-local storage so late emissions land on the
    /// originating view even after the user switches.
    fn run_streaming(
        &self,
        key: &ViewKey,
        body: AsyncBody,
        params: ParamMap,
        auto_scroll: bool,
    ) -> RunHandle {
        let stack = CaptureStack::new();
        let root = Block::column([]);
        {
            let router = self.router.clone();
            let key = key.clone();
            let root = root.clone();
            stack.register_observer(move |item| router.resolve_and_deliver(&key, &root, item));
        }

        let scoped = TASK_VIEW.scope(
            key.clone(),
            TASK_SCOPES.scope(RefCell::new(vec![stack.clone()]), body(params)),
        );
        let body_task = self.runtime.spawn(scoped);

        let router = self.router.clone();
        let journal = self.journal.clone();
        let handle_key = key.clone();
        let key = key.clone();
        let finisher = self.runtime.spawn(async move {
            let mut failure = None;
            match body_task.await {
                Ok(Ok(Some(value))) => {
                    router.registry().set_result(&key, value.clone());
                    stack.append(Emitted::Value(value));
                }
                Ok(Ok(None)) => {}
                Ok(Err(error)) => failure = Some(ExecutionFailure::from_error(&error)),
                Err(join_error) => {
                    failure = Some(if join_error.is_panic() {
                        ExecutionFailure::from_panic(join_error.into_panic().as_ref())
                    } else {
                        ExecutionFailure {
                            message: "command task cancelled".to_string(),
                            trace: String::new(),
                        }
                    });
                }
            }
            settle(&router, &journal, &key, auto_scroll, failure);
        });
        RunHandle::task(handle_key, finisher)
    }

    /// Mode 3 - streaming-threaded: the body runs on a daemonized
    /// worker; emissions flush immediately, display mutation is
    /// marshaled through the surface port, and the worker re-enables
    /// the run control itself. Dispatch returns at once.
    fn run_threaded(
        &self,
        key: &ViewKey,
        body: SyncBody,
        params: ParamMap,
        auto_scroll: bool,
    ) -> RunHandle {
        let registry = self.router.registry();
        registry.set_running(key, true);
        self.router.submit(SurfaceCommand::SetRunEnabled {
            key: key.clone(),
            enabled: false,
        });

        let stack = CaptureStack::new();
        let root = Block::column([]);
        {
            let router = self.router.clone();
            let key = key.clone();
            let root = root.clone();
            stack.register_observer(move |item| router.resolve_and_deliver(&key, &root, item));
        }

        let router = self.router.clone();
        let journal = self.journal.clone();
        let worker_key = key.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("janus-run-{worker_key}"))
            .spawn(move || {
                let _view = capture::push_view(worker_key.clone());
                let outcome = {
                    let _scope = capture::push_scope(stack.clone());
                    catch_unwind(AssertUnwindSafe(|| body(&params)))
                };

                let mut failure = None;
                match outcome {
                    Ok(Ok(Some(value))) => {
                        router.registry().set_result(&worker_key, value.clone());
                        stack.append(Emitted::Value(value));
                    }
                    Ok(Ok(None)) => {}
                    Ok(Err(error)) => failure = Some(ExecutionFailure::from_error(&error)),
                    Err(payload) => failure = Some(ExecutionFailure::from_panic(payload.as_ref())),
                }
                settle(&router, &journal, &worker_key, auto_scroll, failure);

                router.registry().set_running(&worker_key, false);
                router.submit(SurfaceCommand::SetRunEnabled {
                    key: worker_key.clone(),
                    enabled: true,
                });
            });

        match spawned {
            Ok(join) => RunHandle::thread(key.clone(), join),
            Err(error) => {
                let spawn_error = EngineError::SpawnFailed(error.to_string());
                registry.set_running(key, false);
                self.router.submit(SurfaceCommand::SetRunEnabled {
                    key: key.clone(),
                    enabled: true,
                });
                settle(
                    &self.router,
                    &self.journal,
                    key,
                    false,
                    Some(ExecutionFailure {
                        message: spawn_error.to_string(),
                        trace: String::new(),
                    }),
                );
                RunHandle::completed(key.clone())
            }
        }
    }

    /// Runs a command inline: emissions append into the *caller's*
    /// current capture scope (or the immediate-output path) instead of
    /// the command's own view.
    ///
    /// # Errors
    ///
    /// Returns the body's error unchanged; a panic inside the body and
    /// a validation failure are converted to errors. Streaming
    /// commands cannot be included inline.
    pub fn include(
        &self,
        key: &ViewKey,
        spec: &CommandSpec,
        supplied: ParamMap,
    ) -> Result<Option<serde_json::Value>, BodyError> {
        let CommandBody::Sync(body) = &spec.body else {
            return Err(Box::new(EngineError::IncludeStreaming));
        };
        let params = resolve_params(spec, &supplied).map_err(|mut errors| -> BodyError {
            Box::new(errors.remove(0))
        })?;

        let stack = CaptureStack::new();
        let outcome = {
            let _scope = capture::push_scope(stack.clone());
            catch_unwind(AssertUnwindSafe(|| body(&params)))
        };
        let result = match outcome {
            Ok(Ok(value)) => value,
            Ok(Err(error)) => return Err(error),
            Err(payload) => {
                let failure = ExecutionFailure::from_panic(payload.as_ref());
                return Err(format!("included command panicked: {}", failure.message).into());
            }
        };

        if let Some(value) = &result {
            stack.append(Emitted::Value(value.clone()));
        }
        match capture::active_stack() {
            Some(caller) => {
                for item in stack.drain() {
                    caller.append(item);
                }
            }
            None => {
                for item in stack.drain() {
                    if let Err(err) = self.router.immediate(item) {
                        tracing::error!(%key, "inline emission lost: {err}");
                    }
                }
            }
        }

        let registry = self.router.registry();
        registry.ensure_entry(key);
        if let Some(value) = &result {
            registry.set_result(key, value.clone());
        }
        Ok(result)
    }
}

/// Shared run epilogue: error emission, coalescing boundary, final
/// state, journal entry, auto-scroll.
fn settle<C: ChannelContext>(
    router: &Router<C>,
    journal: &Journal,
    key: &ViewKey,
    auto_scroll: bool,
    failure: Option<ExecutionFailure>,
) {
    let registry = router.registry();
    match failure {
        None => {
            registry.flush_text(key);
            registry.set_state(key, RunState::Succeeded);
            journal.record(
                key,
                JournalKind::Finished { success: true },
                serde_json::Value::Null,
            );
        }
        Some(failure) => {
            router.deliver_error(key, &failure);
            registry.flush_text(key);
            registry.set_state(key, RunState::Failed);
            journal.record(
                key,
                JournalKind::Finished { success: false },
                json!({ "error": failure.message }),
            );
        }
    }
    if auto_scroll {
        router.submit(SurfaceCommand::ScrollToEnd { key: key.clone() });
    }
}
