//! The block tree.
//!
//! A [`Block`] is cheap to clone (shared inner), safe to send across
//! threads, and owns its children. The parent link is a weak
//! back-reference used only for hierarchy queries. Ownership flows
//! strictly from container to children.

use crate::{Emitted, Observable, ObserverFn, ObserverId};
use janus_types::RegionId;
use parking_lot::Mutex;
use std::any::Any;
use std::sync::{Arc, OnceLock, Weak};

/// The closed set of block kinds.
///
/// Channels render a block by matching this enum; there is no
/// per-block virtual build method. Adding a kind means touching every
/// channel, which is the point: both channels must agree on the full
/// vocabulary.
#[derive(Debug, Clone)]
pub enum BlockKind {
    /// Plain text. Consecutive plain-text artifacts coalesce at the
    /// destination.
    Text(String),
    /// Markup (markdown) source.
    Markup(String),
    /// Ordered container with no layout intent.
    Group,
    /// Horizontal layout container.
    Row,
    /// Vertical layout container.
    Column,
    /// Tabular data.
    Table {
        /// Column headers.
        columns: Vec<String>,
        /// Row cells, one inner vector per row.
        rows: Vec<Vec<String>>,
    },
    /// A dynamic region: re-rendered in place when bound state changes.
    Region(Arc<RegionBinding>),
}

struct BlockInner {
    kind: BlockKind,
    parent: OnceLock<Weak<BlockInner>>,
    children: Mutex<Vec<Block>>,
    cached: Mutex<Option<Box<dyn Any + Send + Sync>>>,
}

/// The structural unit of captured UI content.
#[derive(Clone)]
pub struct Block {
    inner: Arc<BlockInner>,
}

impl Block {
    fn new(kind: BlockKind) -> Self {
        Self {
            inner: Arc::new(BlockInner {
                kind,
                parent: OnceLock::new(),
                children: Mutex::new(Vec::new()),
                cached: Mutex::new(None),
            }),
        }
    }

    /// A plain-text block.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(BlockKind::Text(content.into()))
    }

    /// A markup (markdown) block.
    #[must_use]
    pub fn markup(source: impl Into<String>) -> Self {
        Self::new(BlockKind::Markup(source.into()))
    }

    /// An ordered group of blocks.
    #[must_use]
    pub fn group(children: impl IntoIterator<Item = Block>) -> Self {
        Self::container(BlockKind::Group, children)
    }

    /// A horizontal layout of blocks.
    #[must_use]
    pub fn row(children: impl IntoIterator<Item = Block>) -> Self {
        Self::container(BlockKind::Row, children)
    }

    /// A vertical layout of blocks.
    #[must_use]
    pub fn column(children: impl IntoIterator<Item = Block>) -> Self {
        Self::container(BlockKind::Column, children)
    }

    /// A table block.
    #[must_use]
    pub fn table(
        columns: impl IntoIterator<Item = impl Into<String>>,
        rows: impl IntoIterator<Item = Vec<String>>,
    ) -> Self {
        Self::new(BlockKind::Table {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: rows.into_iter().collect(),
        })
    }

    fn container(kind: BlockKind, children: impl IntoIterator<Item = Block>) -> Self {
        let block = Self::new(kind);
        for child in children {
            block.attach_child(&child);
        }
        block
    }

    /// Returns the block's kind.
    #[must_use]
    pub fn kind(&self) -> &BlockKind {
        &self.inner.kind
    }

    /// Attaches `child` to this block.
    ///
    /// The child's parent link is set at most once, on its first
    /// attachment. Attaching an already-attached block is a no-op
    /// (logged at debug); re-attachment is not part of the contract.
    pub fn attach_child(&self, child: &Block) {
        let first = child
            .inner
            .parent
            .set(Arc::downgrade(&self.inner))
            .is_ok();
        if first {
            self.inner.children.lock().push(child.clone());
        } else {
            tracing::debug!(kind = ?child.kind(), "ignoring re-attachment of a parented block");
        }
    }

    /// Returns the parent block, if attached and still alive.
    #[must_use]
    pub fn parent(&self) -> Option<Block> {
        self.inner
            .parent
            .get()
            .and_then(Weak::upgrade)
            .map(|inner| Block { inner })
    }

    /// Returns a snapshot of the child list, in attachment order.
    #[must_use]
    pub fn children(&self) -> Vec<Block> {
        self.inner.children.lock().clone()
    }

    /// Returns the plain-text content, for [`BlockKind::Text`] blocks.
    #[must_use]
    pub fn as_plain_text(&self) -> Option<&str> {
        match &self.inner.kind {
            BlockKind::Text(content) => Some(content),
            _ => None,
        }
    }

    /// Stores a channel artifact on the block, replacing any earlier
    /// entry. One channel is active per run, so a single slot suffices.
    pub fn cache_artifact<A: Send + Sync + 'static>(&self, artifact: A) {
        *self.inner.cached.lock() = Some(Box::new(artifact));
    }

    /// Returns a clone of the cached artifact, if one of this type is
    /// present.
    #[must_use]
    pub fn cached_artifact<A: Clone + Send + Sync + 'static>(&self) -> Option<A> {
        self.inner
            .cached
            .lock()
            .as_ref()
            .and_then(|boxed| boxed.downcast_ref::<A>())
            .cloned()
    }
}

impl PartialEq for Block {
    /// Identity equality: two handles are equal when they share the
    /// same inner block.
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Block {}

impl std::fmt::Debug for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Block")
            .field("kind", &self.inner.kind)
            .field("children", &self.inner.children.lock().len())
            .finish()
    }
}

/// Couples a renderer to the reactive states it reads.
///
/// Created by [`bind`]; resolved by the engine into an initial render
/// plus observer registrations that re-render in place on change. The
/// [`RegionId`] is the stable identity replacement is keyed by.
pub struct RegionBinding {
    id: RegionId,
    renderer: Mutex<Box<dyn FnMut() -> Option<Emitted> + Send>>,
    deps: Vec<Arc<dyn Observable>>,
}

impl RegionBinding {
    /// Returns the region's stable identity.
    #[must_use]
    pub fn id(&self) -> RegionId {
        self.id
    }

    /// Runs the renderer once.
    pub fn render(&self) -> Option<Emitted> {
        (self.renderer.lock())()
    }

    /// Registers `callback` on every bound dependency.
    pub fn observe_deps(&self, callback: ObserverFn) -> Vec<ObserverId> {
        self.deps
            .iter()
            .map(|dep| dep.observe(callback.clone()))
            .collect()
    }
}

impl std::fmt::Debug for RegionBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionBinding")
            .field("id", &self.id)
            .field("deps", &self.deps.len())
            .finish()
    }
}

/// Couples a renderer to reactive states, producing a dynamic region
/// block.
///
/// On any dependency change the engine re-runs the renderer inside a
/// fresh capture scope and replaces the previously rendered subtree in
/// place, keyed by the region's identity.
///
/// The renderer may return content, call `emit()` internally, or both;
/// a non-null return value counts as one more emission.
#[must_use]
pub fn bind(
    renderer: impl FnMut() -> Option<Emitted> + Send + 'static,
    deps: impl IntoIterator<Item = Arc<dyn Observable>>,
) -> Block {
    Block::new(BlockKind::Region(Arc::new(RegionBinding {
        id: RegionId::new(),
        renderer: Mutex::new(Box::new(renderer)),
        deps: deps.into_iter().collect(),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_is_set_on_first_attachment_only() {
        let first = Block::column([]);
        let second = Block::column([]);
        let child = Block::text("x");

        first.attach_child(&child);
        assert_eq!(child.parent(), Some(first.clone()));
        assert_eq!(first.children().len(), 1);

        // Re-attachment is ignored: parent unchanged, no second owner.
        second.attach_child(&child);
        assert_eq!(child.parent(), Some(first));
        assert!(second.children().is_empty());
    }

    #[test]
    fn ownership_flows_from_container_to_children() {
        let child = Block::text("x");
        {
            let parent = Block::group([child.clone()]);
            assert_eq!(child.parent(), Some(parent));
        }
        // The container is gone; the weak back-reference does not keep
        // it alive.
        assert_eq!(child.parent(), None);
    }

    #[test]
    fn container_constructors_attach_in_order() {
        let a = Block::text("a");
        let b = Block::text("b");
        let row = Block::row([a.clone(), b.clone()]);
        assert_eq!(row.children(), vec![a, b]);
    }

    #[test]
    fn artifact_cache_round_trips_by_type() {
        let block = Block::text("x");
        assert_eq!(block.cached_artifact::<String>(), None);
        block.cache_artifact("artifact".to_string());
        assert_eq!(
            block.cached_artifact::<String>(),
            Some("artifact".to_string())
        );
        // A different type misses.
        assert_eq!(block.cached_artifact::<u32>(), None);
    }

    #[test]
    fn region_binding_renders_and_exposes_identity() {
        let region = bind(|| Some(Emitted::from("tick")), []);
        let BlockKind::Region(binding) = region.kind() else {
            panic!("expected a region");
        };
        assert!(matches!(binding.render(), Some(Emitted::Markup(s)) if s == "tick"));
        assert_eq!(binding.id(), binding.id());
    }
}
