//! Application-level behaviour: lookup, selection, clipboard, journal.

use janus_app::{App, AppError};
use janus_engine::{
    emit, emit_text, JournalKind, RecordingSurface, SurfaceCommand, Widget, WidgetChannel,
};
use janus_spec::{AppSpec, CommandSpec, DisplayOptions, GroupSpec, ParamMap, ParamSpec, ParamValue};
use janus_types::ErrorCode;
use std::sync::Arc;

fn demo_app() -> (App<WidgetChannel>, RecordingSurface<Widget>) {
    let spec = AppSpec::new()
        .with_title("Demo")
        .with_command(
            CommandSpec::sync("greet", |params| {
                let name = params
                    .get("name")
                    .and_then(ParamValue::as_str)
                    .unwrap_or("world");
                emit(format!("Hello **{name}**"));
                Ok(Some(serde_json::json!(format!("greeted {name}"))))
            })
            .with_param(ParamSpec::string("name").with_default("world")),
        )
        .with_command(
            CommandSpec::sync("status", |_| {
                emit_text("all systems nominal");
                Ok(None)
            })
            .with_display(DisplayOptions::view()),
        )
        .with_group(
            GroupSpec::new("users")
                .with_command(CommandSpec::sync("create", |_| {
                    emit("created");
                    Ok(None)
                }))
                .with_command(CommandSpec::sync("list", |_| {
                    emit("listed");
                    Ok(None)
                })),
        );

    let surface = RecordingSurface::new();
    let app = App::new(
        spec,
        WidgetChannel::new(),
        Arc::new(surface.clone()),
        tokio::runtime::Handle::current(),
    );
    (app, surface)
}

#[tokio::test]
async fn qualified_and_sibling_lookup() {
    let (app, _surface) = demo_app();

    assert!(app.command("greet").is_ok());
    assert!(app.command("users:create").is_ok());
    let err = app.command("bogus").unwrap_err();
    assert!(matches!(err, AppError::CommandNotFound(_)));
    assert_eq!(err.code(), "APP_COMMAND_NOT_FOUND");

    // After selecting inside the group, siblings resolve unqualified.
    app.select("users:create").unwrap();
    let sibling = app.command("list").unwrap();
    assert_eq!(sibling.key().qualified(), "users:list");
}

#[tokio::test]
async fn run_routes_to_the_commands_own_view_and_records_the_result() {
    let (app, _surface) = demo_app();

    let handle = app.command("greet").unwrap();
    let mut params = ParamMap::new();
    params.insert("name".into(), "ada".into());
    handle.run(params);

    assert_eq!(handle.captured_text(), "Hello **ada**\ngreeted ada");
    assert_eq!(handle.result(), Some(serde_json::json!("greeted ada")));
}

#[tokio::test]
async fn defaults_apply_when_a_parameter_is_omitted() {
    let (app, _surface) = demo_app();
    let handle = app.command("greet").unwrap();
    handle.run(ParamMap::new());
    assert_eq!(handle.result(), Some(serde_json::json!("greeted world")));
}

#[tokio::test]
async fn auto_run_fires_on_first_selection_only_when_empty() {
    let (app, _surface) = demo_app();

    let auto = app.select("status").unwrap();
    assert!(auto.is_some(), "view commands auto-run on selection");
    let status = app.command("status").unwrap();
    assert_eq!(status.captured_text(), "all systems nominal");
}

#[tokio::test]
async fn selection_is_mirrored_to_the_surface() {
    let (app, surface) = demo_app();
    app.select("greet").unwrap();
    app.select("status").unwrap();

    let mut visibility = Vec::new();
    for command in surface.commands() {
        if let SurfaceCommand::SetVisible { key, visible } = command {
            visibility.push((key.qualified(), visible));
        }
    }
    assert!(visibility.contains(&("greet".to_string(), true)));
    assert!(visibility.contains(&("greet".to_string(), false)));
    assert!(visibility.contains(&("status".to_string(), true)));
}

#[tokio::test]
async fn clipboard_confirms_on_the_widget_channel() {
    let (app, surface) = demo_app();
    app.select("greet").unwrap();

    app.clipboard("copied payload");

    let copied = surface.commands().into_iter().any(|command| {
        matches!(command, SurfaceCommand::Clipboard { ref text } if text == "copied payload")
    });
    assert!(copied);
    // The confirmation emission landed in the selected view.
    let greet = app.command("greet").unwrap();
    assert!(greet.captured_text().contains("Copied to clipboard"));
}

#[tokio::test]
async fn journal_traces_the_run_lifecycle() {
    let (app, _surface) = demo_app();
    app.command("greet").unwrap().run(ParamMap::new());

    let kinds: Vec<_> = app
        .journal()
        .recent(10)
        .into_iter()
        .map(|entry| entry.kind)
        .collect();
    assert!(kinds.contains(&JournalKind::Selected));
    assert!(kinds.contains(&JournalKind::Started));
    assert!(kinds.contains(&JournalKind::Finished { success: true }));
}

#[tokio::test]
async fn commands_lists_roots_then_groups_in_order() {
    let (app, _surface) = demo_app();
    let names: Vec<String> = app
        .commands()
        .iter()
        .map(|handle| handle.key().qualified())
        .collect();
    assert_eq!(names, ["greet", "status", "users:create", "users:list"]);
}
