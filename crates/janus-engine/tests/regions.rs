//! Dynamic regions: bound state drives in-place re-rendering.

mod common;

use common::widget_coordinator;
use janus_engine::{bind, emit, Emitted, State, SurfaceCommand, Widget};
use janus_spec::{CommandSpec, ParamMap};
use janus_types::{RegionId, ViewKey};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Finds the region id in a view's first region artifact.
fn find_region(cells: &[janus_engine::OutputCell<Widget>]) -> RegionId {
    for cell in cells {
        if let janus_engine::OutputCell::Artifact {
            artifact: Widget::Region { id, .. },
            ..
        } = cell
        {
            return *id;
        }
    }
    panic!("no region artifact in cells");
}

#[tokio::test]
async fn equal_sets_skip_rerenders_and_changes_replace_in_place() {
    let (coordinator, surface) = widget_coordinator();
    let counter = State::new(0);
    let renders = Arc::new(AtomicUsize::new(0));

    let state_for_body = counter.clone();
    let renders_for_body = renders.clone();
    let spec = CommandSpec::sync("dashboard", move |_| {
        emit("# Dashboard");
        let state = state_for_body.clone();
        let renders = renders_for_body.clone();
        emit(bind(
            move || {
                renders.fetch_add(1, Ordering::SeqCst);
                Some(Emitted::plain(format!("count = {}", state.get())))
            },
            [state_for_body.observable()],
        ));
        emit("footer");
        Ok(None)
    });
    let key = ViewKey::root("dashboard");

    coordinator.dispatch(&key, &spec, ParamMap::new());
    assert_eq!(renders.load(Ordering::SeqCst), 1);

    let registry = coordinator.router().registry();
    let cells_before = registry.cells(&key);
    let region = find_region(&cells_before);
    assert_eq!(
        registry.region_artifact(&key, region).unwrap(),
        Widget::Region {
            id: region,
            children: vec![Widget::Text {
                content: "count = 0".into()
            }],
        }
    );

    // 1, 1, 2: the second set is a no-op, so exactly two re-renders.
    counter.set(1);
    counter.set(1);
    counter.set(2);
    assert_eq!(renders.load(Ordering::SeqCst), 3);

    // The region mirror shows the fresh render...
    assert_eq!(
        registry.region_artifact(&key, region).unwrap(),
        Widget::Region {
            id: region,
            children: vec![Widget::Text {
                content: "count = 2".into()
            }],
        }
    );
    // ...surgically: the cell list is untouched.
    assert_eq!(registry.cell_count(&key), cells_before.len());

    // The surface saw exactly two in-place replacements for this
    // region, and no extra appends.
    let replacements = surface
        .commands()
        .into_iter()
        .filter(|command| {
            matches!(
                command,
                SurfaceCommand::ReplaceRegion { region: r, .. } if *r == region
            )
        })
        .count();
    assert_eq!(replacements, 2);
}

#[tokio::test]
async fn a_renderer_may_emit_instead_of_returning() {
    let (coordinator, _surface) = widget_coordinator();
    let items = State::new(2);

    let state_for_body = items.clone();
    let spec = CommandSpec::sync("list", move |_| {
        let state = state_for_body.clone();
        emit(bind(
            move || {
                for i in 0..state.get() {
                    emit(Emitted::plain(format!("item {i}")));
                }
                None
            },
            [state_for_body.observable()],
        ));
        Ok(None)
    });
    let key = ViewKey::root("list");

    coordinator.dispatch(&key, &spec, ParamMap::new());

    let registry = coordinator.router().registry();
    let region = find_region(&registry.cells(&key));
    let before = registry.region_artifact(&key, region).unwrap();
    assert_eq!(
        before,
        Widget::Region {
            id: region,
            children: vec![
                Widget::Text {
                    content: "item 0".into()
                },
                Widget::Text {
                    content: "item 1".into()
                },
            ],
        }
    );

    items.set(3);
    let after = registry.region_artifact(&key, region).unwrap();
    let Widget::Region { children, .. } = after else {
        panic!("expected region");
    };
    assert_eq!(children.len(), 3);
}

#[tokio::test]
async fn clearing_the_view_detaches_its_regions() {
    let (coordinator, surface) = widget_coordinator();
    let counter = State::new(0);
    let renders = Arc::new(AtomicUsize::new(0));

    let state_for_body = counter.clone();
    let renders_for_body = renders.clone();
    let spec = CommandSpec::sync("volatile", move |_| {
        let state = state_for_body.clone();
        let renders = renders_for_body.clone();
        emit(bind(
            move || {
                renders.fetch_add(1, Ordering::SeqCst);
                Some(Emitted::plain(format!("{}", state.get())))
            },
            [state_for_body.observable()],
        ));
        Ok(None)
    });
    let key = ViewKey::root("volatile");

    coordinator.dispatch(&key, &spec, ParamMap::new());
    assert_eq!(renders.load(Ordering::SeqCst), 1);

    // Clearing drops the binding; further state ticks are no-ops for
    // this dead region.
    coordinator.router().registry().clear(&key);
    let commands_before = surface.len();
    counter.set(10);
    assert_eq!(renders.load(Ordering::SeqCst), 1);
    assert_eq!(surface.len(), commands_before);
}
