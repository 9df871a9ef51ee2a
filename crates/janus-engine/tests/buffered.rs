//! Buffered-sync execution: ordering, coalescing, validation, error
//! conversion, inline inclusion.

mod common;

use common::{cell_texts, text_coordinator};
use janus_engine::{emit, emit_text, Coordinator, EmitWriter, RunState, TextChannel};
use janus_spec::{CommandSpec, ParamMap, ParamSpec};
use janus_types::ViewKey;
use serde_json::json;
use std::io::Write;
use std::sync::{Arc, OnceLock};

#[tokio::test]
async fn output_order_matches_emission_order() {
    let (coordinator, _surface) = text_coordinator();
    let spec = CommandSpec::sync("ordered", |_| {
        emit("first");
        emit("second");
        emit("third");
        Ok(None)
    });
    let key = ViewKey::root("ordered");

    coordinator.dispatch(&key, &spec, ParamMap::new());

    assert_eq!(cell_texts(&coordinator, &key), ["first", "second", "third"]);
    assert_eq!(coordinator.router().registry().state(&key), RunState::Succeeded);
}

#[tokio::test]
async fn widget_updates_flush_only_after_the_body_returns() {
    let (coordinator, surface) = text_coordinator();
    let observed_during_run = Arc::new(OnceLock::new());
    let probe = observed_during_run.clone();
    let inner_surface = surface.clone();
    let spec = CommandSpec::sync("batched", move |_| {
        emit("content");
        // Still inside the body: nothing may have reached the surface.
        let _ = probe.set(inner_surface.len());
        Ok(None)
    });
    let key = ViewKey::root("batched");

    coordinator.dispatch(&key, &spec, ParamMap::new());

    assert_eq!(observed_during_run.get(), Some(&0));
    assert!(surface.len() > 0);
}

#[tokio::test]
async fn emissions_then_failure_produce_content_then_error() {
    let (coordinator, _surface) = text_coordinator();
    let spec = CommandSpec::sync("failing", |_| {
        emit("a");
        emit("b");
        Err("midway failure".into())
    });
    let key = ViewKey::root("failing");

    coordinator.dispatch(&key, &spec, ParamMap::new());

    let cells = cell_texts(&coordinator, &key);
    assert_eq!(cells.len(), 3);
    assert_eq!(cells[0], "a");
    assert_eq!(cells[1], "b");
    assert!(cells[2].starts_with("ERROR: midway failure"));
    assert_eq!(coordinator.router().registry().state(&key), RunState::Failed);
}

#[tokio::test]
async fn a_panicking_body_is_contained() {
    let (coordinator, _surface) = text_coordinator();
    let spec = CommandSpec::sync("explosive", |_| {
        emit("before");
        panic!("kaboom");
    });
    let key = ViewKey::root("explosive");

    // Must not propagate out of the coordinator.
    coordinator.dispatch(&key, &spec, ParamMap::new());

    let cells = cell_texts(&coordinator, &key);
    assert_eq!(cells[0], "before");
    assert!(cells[1].contains("kaboom"));
    assert_eq!(coordinator.router().registry().state(&key), RunState::Failed);
}

#[tokio::test]
async fn missing_required_parameter_never_reaches_running() {
    let (coordinator, _surface) = text_coordinator();
    let executed = Arc::new(OnceLock::new());
    let probe = executed.clone();
    let spec = CommandSpec::sync("strict", move |_| {
        let _ = probe.set(true);
        Ok(None)
    })
    .with_param(ParamSpec::string("name").required());
    let key = ViewKey::root("strict");

    coordinator.dispatch(&key, &spec, ParamMap::new());

    // The body never ran.
    assert_eq!(executed.get(), None);
    // Exactly one validation emission, naming the parameter.
    let cells = cell_texts(&coordinator, &key);
    assert_eq!(cells.len(), 1);
    assert!(cells[0].contains("'name'"));
    assert_eq!(coordinator.router().registry().state(&key), RunState::Failed);
    // The journal shows validation failure and no start.
    let kinds: Vec<_> = coordinator
        .journal()
        .recent(10)
        .into_iter()
        .map(|entry| entry.kind)
        .collect();
    assert!(kinds.contains(&janus_engine::JournalKind::ValidationFailed));
    assert!(!kinds.contains(&janus_engine::JournalKind::Started));
}

#[tokio::test]
async fn a_returned_value_is_one_final_emission_and_the_result() {
    let (coordinator, _surface) = text_coordinator();
    let spec = CommandSpec::sync("valued", |_| {
        emit("work");
        Ok(Some(json!("summary")))
    });
    let key = ViewKey::root("valued");

    coordinator.dispatch(&key, &spec, ParamMap::new());

    let cells = cell_texts(&coordinator, &key);
    assert_eq!(cells, ["work", "summary"]);
    assert_eq!(
        coordinator.router().registry().result(&key),
        Some(json!("summary"))
    );
}

#[tokio::test]
async fn plain_text_coalesces_until_a_non_text_boundary() {
    let (coordinator, _surface) = text_coordinator();
    let spec = CommandSpec::sync("printer", |_| {
        emit_text("line 1");
        emit_text("line 2");
        emit_text("line 3");
        emit("## separator");
        emit_text("line 4");
        emit_text("line 5");
        Ok(None)
    });
    let key = ViewKey::root("printer");

    coordinator.dispatch(&key, &spec, ParamMap::new());

    let cells = cell_texts(&coordinator, &key);
    assert_eq!(cells.len(), 3);
    assert_eq!(cells[0], "line 1\nline 2\nline 3");
    assert_eq!(cells[1], "## separator");
    assert_eq!(cells[2], "line 4\nline 5");
}

#[tokio::test]
async fn writer_lines_become_plain_emissions_as_produced() {
    let (coordinator, _surface) = text_coordinator();
    let spec = CommandSpec::sync("writer", |_| {
        let mut out = EmitWriter::new();
        writeln!(out, "step 1")?;
        writeln!(out, "step 2")?;
        write!(out, "unterminated")?;
        Ok(None)
    });
    let key = ViewKey::root("writer");

    coordinator.dispatch(&key, &spec, ParamMap::new());

    let cells = cell_texts(&coordinator, &key);
    assert_eq!(cells, ["step 1\nstep 2\nunterminated"]);
}

#[tokio::test]
async fn include_appends_into_the_callers_capture() {
    let (coordinator, _surface) = text_coordinator();
    let inner = CommandSpec::sync("inner", |_| {
        emit("from inner");
        Ok(Some(json!(7)))
    });

    let slot: Arc<OnceLock<Arc<Coordinator<TextChannel>>>> = Arc::new(OnceLock::new());
    let inner_for_outer = inner.clone();
    let slot_for_outer = slot.clone();
    let outer = CommandSpec::sync("outer", move |_| {
        emit("before include");
        let coordinator = slot_for_outer.get().expect("wired");
        let result = coordinator.include(
            &ViewKey::root("inner"),
            &inner_for_outer,
            ParamMap::new(),
        )?;
        emit(format!("inner said {}", result.unwrap()));
        Ok(None)
    });
    slot.set(coordinator.clone()).ok();

    let outer_key = ViewKey::root("outer");
    coordinator.dispatch(&outer_key, &outer, ParamMap::new());

    // Inner output landed inline, in the outer view, in call order.
    assert_eq!(
        cell_texts(&coordinator, &outer_key),
        ["before include", "from inner", "7", "inner said 7"]
    );
    // The inner command's own view stayed empty, but its result was
    // recorded.
    let inner_key = ViewKey::root("inner");
    assert_eq!(coordinator.router().registry().cell_count(&inner_key), 0);
    assert_eq!(
        coordinator.router().registry().result(&inner_key),
        Some(json!(7))
    );
}
