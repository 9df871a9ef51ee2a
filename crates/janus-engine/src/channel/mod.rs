//! Channels - resolving emissions into renderable artifacts.
//!
//! A channel turns channel-independent content into its own renderable
//! artifact type: formatted text blocks for the text channel, retained
//! widget values for the widget channel. The two implementations sit
//! behind one contract, [`ChannelContext`], and (critically) the
//! five-case resolution algorithm is written **once**, generically, in
//! [`Router::resolve`]. A channel only supplies leaf constructors; it
//! cannot reorder or reinterpret the dispatch, so the same command
//! produces structurally consistent output on both channels.
//!
//! # Resolution order
//!
//! 1. Markup string → markup artifact.
//! 2. Block → attach to parent, build by kind, cache on the block.
//! 3. Dynamic callable → run once in a fresh capture scope, resolve
//!    into a streaming container, keep the scope observer alive for
//!    later live appends.
//! 4. Plain callable → run in a fresh capture scope; a non-null return
//!    value is one more emission; one artifact returns unwrapped,
//!    several wrap in an ordered group.
//! 5. Anything else → stringified text artifact.
//!
//! Cases 1, 2 and 5 share the [`janus_blocks::coerce`] rule, so the
//! leaf coercions are exactly the channel-independent ones.

mod text;
mod widget;

pub use text::{ConsoleRenderer, TextArtifact, TextChannel};
pub use widget::{Widget, WidgetChannel};

use crate::capture::{self, CaptureStack};
use crate::registry::{RouteEffect, ViewRegistry};
use crate::surface::{Surface, SurfaceCommand};
use crate::{EngineError, ExecutionFailure};
use janus_blocks::{coerce, Block, BlockKind, Coerced, Emitted, RegionBinding};
use janus_types::{RegionId, StreamId, ViewKey};
use std::sync::Arc;

/// A channel's renderable artifact.
pub trait Artifact: Clone + Send + Sync + std::fmt::Debug + 'static {
    /// The artifact's text when it is a plain-text artifact; the
    /// registry coalesces consecutive plain artifacts into one block.
    fn as_plain_text(&self) -> Option<&str>;

    /// Text rendition for the captured-text record.
    fn display_text(&self) -> String;
}

/// Per-channel resolver: leaf and container constructors.
///
/// Implementations are stateless per call; everything they need beyond
/// the input is reachable through the router that drives them.
pub trait ChannelContext: Send + Sync + 'static {
    /// The channel's renderable artifact type.
    type Artifact: Artifact;

    /// Channel name, for logs and channel-conditional chrome.
    fn name(&self) -> &'static str;

    /// A plain-text artifact (coalescible).
    fn plain(&self, text: &str) -> Self::Artifact;

    /// A rendered-markup artifact.
    fn markup(&self, source: &str) -> Self::Artifact;

    /// An ordered group of artifacts.
    fn group(&self, children: Vec<Self::Artifact>) -> Self::Artifact;

    /// A horizontal layout.
    fn row(&self, children: Vec<Self::Artifact>) -> Self::Artifact;

    /// A vertical layout.
    fn column(&self, children: Vec<Self::Artifact>) -> Self::Artifact;

    /// A table.
    fn table(&self, columns: &[String], rows: &[Vec<String>]) -> Self::Artifact;

    /// A streaming container with its initial children.
    fn stream(&self, id: StreamId, children: Vec<Self::Artifact>) -> Self::Artifact;

    /// A dynamic region's render.
    fn region(&self, id: RegionId, children: Vec<Self::Artifact>) -> Self::Artifact;

    /// An error-styled artifact.
    fn error(&self, failure: &ExecutionFailure) -> Self::Artifact;
}

/// Resolves emissions and routes artifacts to view destinations.
///
/// Holds the channel context, the registry (model) and the surface
/// (view). Cheap to clone; every execution mode and region observer
/// carries one.
pub struct Router<C: ChannelContext> {
    ctx: Arc<C>,
    registry: ViewRegistry<C::Artifact>,
    surface: Arc<dyn Surface<C::Artifact>>,
}

impl<C: ChannelContext> Clone for Router<C> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
            registry: self.registry.clone(),
            surface: self.surface.clone(),
        }
    }
}

impl<C: ChannelContext> Router<C> {
    /// Creates a router over a context, registry and surface.
    #[must_use]
    pub fn new(
        ctx: Arc<C>,
        registry: ViewRegistry<C::Artifact>,
        surface: Arc<dyn Surface<C::Artifact>>,
    ) -> Self {
        Self {
            ctx,
            registry,
            surface,
        }
    }

    /// Returns the channel context.
    #[must_use]
    pub fn ctx(&self) -> &C {
        &self.ctx
    }

    /// Returns the registry.
    #[must_use]
    pub fn registry(&self) -> &ViewRegistry<C::Artifact> {
        &self.registry
    }

    /// Submits a surface command, logging (not propagating) a closed
    /// surface; output routing must survive a torn-down display.
    pub fn submit(&self, command: SurfaceCommand<C::Artifact>) {
        if let Err(err) = self.surface.submit(command) {
            tracing::warn!(channel = self.ctx.name(), "surface rejected command: {err}");
        }
    }

    /// Resolves the currently executing command, falling back to the
    /// registry's selected command.
    #[must_use]
    pub fn current_key(&self) -> Option<ViewKey> {
        capture::current_view().or_else(|| self.registry.selected())
    }

    /// Routes a resolved artifact to `key`'s destination, coalescing
    /// plain text.
    pub fn deliver(&self, key: &ViewKey, artifact: C::Artifact) {
        let plain = artifact.as_plain_text().map(str::to_owned);
        let display = artifact.display_text();
        let effect = self
            .registry
            .append_artifact(key, artifact.clone(), plain, display);
        match effect {
            RouteEffect::Appended { cell } => self.submit(SurfaceCommand::Append {
                key: key.clone(),
                cell,
                artifact,
            }),
            RouteEffect::TextUpdated { cell, text } => self.submit(SurfaceCommand::UpdateText {
                key: key.clone(),
                cell,
                text,
            }),
        }
    }

    /// Resolves an emission and routes the artifact to `key`.
    pub fn resolve_and_deliver(&self, key: &ViewKey, parent: &Block, item: Emitted) {
        let artifact = self.resolve(key, parent, item);
        self.deliver(key, artifact);
    }

    /// Routes an error-styled artifact to `key`.
    pub fn deliver_error(&self, key: &ViewKey, failure: &ExecutionFailure) {
        let artifact = self.ctx.error(failure);
        self.deliver(key, artifact);
    }

    /// Immediate-output path for emissions outside any capture scope.
    ///
    /// Resolves against a throwaway root and delivers to the current
    /// (or selected) command's view.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoDestination`] when no command is current or
    /// selected.
    pub fn immediate(&self, item: Emitted) -> Result<(), EngineError> {
        let key = self.current_key().ok_or(EngineError::NoDestination)?;
        let root = Block::column([]);
        self.resolve_and_deliver(&key, &root, item);
        Ok(())
    }

    /// Replaces a dynamic region's render in place, in the registry
    /// mirror and on the surface.
    pub fn replace_region(&self, key: &ViewKey, region: RegionId, artifact: C::Artifact) {
        self.registry.replace_region(key, region, artifact.clone());
        self.submit(SurfaceCommand::ReplaceRegion {
            key: key.clone(),
            region,
            artifact,
        });
    }

    /// Appends a live child to a streaming container.
    pub fn stream_append(&self, key: &ViewKey, stream: StreamId, artifact: C::Artifact) {
        self.registry.stream_append(key, stream, artifact.clone());
        self.submit(SurfaceCommand::StreamAppend {
            key: key.clone(),
            stream,
            artifact,
        });
    }

    /// The five-case resolution algorithm. See the module docs for the
    /// case ordering; both channels run exactly this code.
    pub fn resolve(&self, key: &ViewKey, parent: &Block, item: Emitted) -> C::Artifact {
        match coerce(item) {
            // Cases 1, 2 and 5: everything block-shaped. Coercion has
            // already decided what the emission means; attach, build by
            // kind, cache.
            Coerced::Block(block) => {
                parent.attach_child(&block);
                if let Some(cached) = block.cached_artifact::<C::Artifact>() {
                    return cached;
                }
                let artifact = self.build_block(key, &block);
                block.cache_artifact(artifact.clone());
                artifact
            }

            // Case 4: plain callable. Capture, then resolve the
            // sequence; unwrap a single artifact.
            Coerced::Lazy(body) => {
                let stack = CaptureStack::new();
                let returned = {
                    let _scope = capture::push_scope(stack.clone());
                    body()
                };
                if let Some(item) = returned {
                    stack.append(item);
                }
                let mut artifacts: Vec<C::Artifact> = stack
                    .drain()
                    .into_iter()
                    .map(|item| self.resolve(key, parent, item))
                    .collect();
                if artifacts.len() == 1 {
                    artifacts.pop().expect("length checked")
                } else {
                    self.ctx.group(artifacts)
                }
            }

            // Case 3: dynamic callable. Capture once, then keep the
            // scope's observer alive so the same producer can keep
            // appending live children.
            Coerced::Dynamic(body) => {
                let stack = CaptureStack::new();
                let returned = {
                    let _scope = capture::push_scope(stack.clone());
                    body()
                };
                if let Some(item) = returned {
                    stack.append(item);
                }
                let id = StreamId::new();
                let initial: Vec<C::Artifact> = stack
                    .drain()
                    .into_iter()
                    .map(|item| self.resolve(key, parent, item))
                    .collect();
                let container = self.ctx.stream(id, initial);

                let router = self.clone();
                let route_key = key.clone();
                let route_parent = parent.clone();
                stack.register_observer(move |item| {
                    let artifact = router.resolve(&route_key, &route_parent, item);
                    router.stream_append(&route_key, id, artifact);
                });
                container
            }
        }
    }

    /// Builds a block by matching its kind; containers recurse over
    /// their owned children.
    fn build_block(&self, key: &ViewKey, block: &Block) -> C::Artifact {
        match block.kind() {
            BlockKind::Text(text) => self.ctx.plain(text),
            BlockKind::Markup(source) => self.ctx.markup(source),
            BlockKind::Group => self.ctx.group(self.build_children(key, block)),
            BlockKind::Row => self.ctx.row(self.build_children(key, block)),
            BlockKind::Column => self.ctx.column(self.build_children(key, block)),
            BlockKind::Table { columns, rows } => self.ctx.table(columns, rows),
            BlockKind::Region(binding) => self.mount_region(key, binding.clone()),
        }
    }

    fn build_children(&self, key: &ViewKey, block: &Block) -> Vec<C::Artifact> {
        block
            .children()
            .iter()
            .map(|child| {
                if let Some(cached) = child.cached_artifact::<C::Artifact>() {
                    return cached;
                }
                let artifact = self.build_block(key, child);
                child.cache_artifact(artifact.clone());
                artifact
            })
            .collect()
    }

    /// Mounts a dynamic region: initial render now, re-render in place
    /// on every bound state change. Replacement is keyed by the
    /// region's stable identity, so unrelated cells are untouched.
    fn mount_region(&self, key: &ViewKey, binding: Arc<RegionBinding>) -> C::Artifact {
        let children = self.render_region(key, &binding);
        let artifact = self.ctx.region(binding.id(), children);
        self.registry
            .set_region(key, binding.id(), artifact.clone(), binding.clone());

        let router = self.clone();
        let route_key = key.clone();
        // The observer holds the binding weakly: the registry entry
        // owns it, and a cleared entry must turn the observer into a
        // no-op rather than keep a dead region rendering.
        let weak = Arc::downgrade(&binding);
        binding.observe_deps(Arc::new(move || {
            let Some(binding) = weak.upgrade() else {
                return;
            };
            let children = router.render_region(&route_key, &binding);
            let artifact = router.ctx.region(binding.id(), children);
            router.replace_region(&route_key, binding.id(), artifact);
        }));

        artifact
    }

    fn render_region(&self, key: &ViewKey, binding: &RegionBinding) -> Vec<C::Artifact> {
        let stack = CaptureStack::new();
        let returned = {
            let _scope = capture::push_scope(stack.clone());
            binding.render()
        };
        if let Some(item) = returned {
            stack.append(item);
        }
        // Fresh parent per render: the previous render's blocks are
        // discarded wholesale.
        let root = Block::column([]);
        stack
            .drain()
            .into_iter()
            .map(|item| self.resolve(key, &root, item))
            .collect()
    }
}
