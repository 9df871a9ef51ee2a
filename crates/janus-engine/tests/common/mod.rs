//! Shared fixtures for engine integration tests.
#![allow(dead_code)]

use janus_engine::{
    Artifact, Coordinator, Journal, OutputCell, RecordingSurface, Router, TextArtifact,
    TextChannel, ViewRegistry, Widget, WidgetChannel,
};
use janus_types::ViewKey;
use std::sync::Arc;

/// Coordinator over the text channel with a recording surface.
pub fn text_coordinator() -> (Arc<Coordinator<TextChannel>>, RecordingSurface<TextArtifact>) {
    let surface = RecordingSurface::new();
    let router = Router::new(
        Arc::new(TextChannel::new()),
        ViewRegistry::new(),
        Arc::new(surface.clone()),
    );
    let coordinator = Arc::new(Coordinator::new(
        router,
        Journal::new(),
        tokio::runtime::Handle::current(),
    ));
    (coordinator, surface)
}

/// Coordinator over the widget channel with a recording surface.
pub fn widget_coordinator() -> (Arc<Coordinator<WidgetChannel>>, RecordingSurface<Widget>) {
    let surface = RecordingSurface::new();
    let router = Router::new(
        Arc::new(WidgetChannel::new()),
        ViewRegistry::new(),
        Arc::new(surface.clone()),
    );
    let coordinator = Arc::new(Coordinator::new(
        router,
        Journal::new(),
        tokio::runtime::Handle::current(),
    ));
    (coordinator, surface)
}

/// Per-cell display text of a view's destination, in order.
pub fn cell_texts<A: Artifact>(
    coordinator: &Coordinator<impl janus_engine::ChannelContext<Artifact = A>>,
    key: &ViewKey,
) -> Vec<String> {
    coordinator
        .router()
        .registry()
        .cells(key)
        .into_iter()
        .map(|cell| match cell {
            OutputCell::TextRun { lines, .. } => lines.join("\n"),
            OutputCell::Artifact { artifact, .. } => artifact.display_text(),
        })
        .collect()
}
