//! The bundled demo command set.
//!
//! One command per engine capability, so `janus run <name>` exercises
//! every execution mode and content kind end to end.

use janus_engine::{bind, emit, emit_text, Block, EmitWriter, Emitted, State};
use janus_spec::{
    AppSpec, CommandSpec, DisplayOptions, GroupSpec, ParamSpec, ParamValue,
};
use serde_json::json;
use std::io::Write;
use std::time::Duration;

/// Builds the demo application spec.
pub fn app_spec() -> AppSpec {
    AppSpec::new()
        .with_title("Janus Demo")
        .with_description("One command per engine capability")
        .with_command(greet())
        .with_command(report())
        .with_command(dashboard())
        .with_command(process())
        .with_command(ticker())
        .with_group(
            GroupSpec::new("files")
                .with_command(listing())
                .with_command(count()),
        )
}

fn greet() -> CommandSpec {
    CommandSpec::sync("greet", |params| {
        let name = params
            .get("name")
            .and_then(ParamValue::as_str)
            .unwrap_or("world");
        emit(format!("# Hello, {name}!"));
        emit_text(format!("plain greeting for {name}"));
        Ok(Some(json!(format!("greeted {name}"))))
    })
    .with_help("Greet someone, in markdown and plain text")
    .with_param(
        ParamSpec::string("name")
            .with_default("world")
            .with_help("Who to greet"),
    )
}

fn report() -> CommandSpec {
    CommandSpec::sync("report", |_| {
        emit("## Inventory");
        emit(Block::table(
            ["item", "count"],
            vec![
                vec!["bolts".to_string(), "420".to_string()],
                vec!["nuts".to_string(), "314".to_string()],
                vec!["washers".to_string(), "1024".to_string()],
            ],
        ));
        emit(Emitted::lazy(|| {
            emit("generated *inline*");
            emit_text("and one plain line");
            None
        }));
        Ok(None)
    })
    .with_help("Tables, markup and nested capture")
}

fn dashboard() -> CommandSpec {
    CommandSpec::sync("dashboard", |_| {
        let tick = State::new(0);
        emit("# Dashboard");
        let shown = tick.clone();
        emit(bind(
            move || Some(Emitted::plain(format!("tick = {}", shown.get()))),
            [tick.observable()],
        ));
        // Three ticks while the view is live.
        for i in 1..=3 {
            tick.set(i);
        }
        Ok(None)
    })
    .with_display(DisplayOptions::view())
    .with_help("A reactive region bound to state")
}

fn process() -> CommandSpec {
    CommandSpec::threaded("process", |_| {
        for step in 1..=10 {
            emit_text(format!("step {step}/10"));
            std::thread::sleep(Duration::from_millis(200));
        }
        Ok(Some(json!("processed 10 steps")))
    })
    .with_help("Long-running background work with live output")
}

fn ticker() -> CommandSpec {
    CommandSpec::streaming("ticker", |_| async {
        for beat in 1..=5 {
            emit(format!("beat **{beat}**"));
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        Ok(None)
    })
    .with_help("Cooperative streaming output")
}

fn listing() -> CommandSpec {
    CommandSpec::sync("list", |_| {
        let mut out = EmitWriter::new();
        for entry in ["src/", "tests/", "Cargo.toml"] {
            writeln!(out, "{entry}")?;
        }
        Ok(None)
    })
    .with_help("Standard-output-style emission through a writer")
}

fn count() -> CommandSpec {
    CommandSpec::sync("count", |_| Ok(Some(json!(3))))
        .with_help("Return a bare value")
}
