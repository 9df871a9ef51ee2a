//! The emission union and the shared coercion rule.

use crate::Block;

/// A plain callable emission: runs once inside a fresh capture scope;
/// a non-null return value counts as one more emission.
pub type LazyFn = Box<dyn FnOnce() -> Option<Emitted> + Send + 'static>;

/// A dynamic callable emission: like [`LazyFn`], but the capture scope's
/// observer stays alive afterwards so the same producer can keep
/// appending live children.
pub type DynamicFn = Box<dyn FnOnce() -> Option<Emitted> + Send + 'static>;

/// The raw union accepted by `emit()`.
///
/// The meaning of each variant is fixed by [`coerce`] and is identical
/// on every channel:
///
/// | Variant | Meaning |
/// |---------|---------|
/// | `Empty` | empty text block (a blank line) |
/// | `Markup` | rich-text/markup block |
/// | `Value` | stringified text block |
/// | `Block` | used as-is |
/// | `Lazy` | nested capture, resolved once |
/// | `Dynamic` | nested capture that keeps streaming |
pub enum Emitted {
    /// Nothing; renders as an empty text block.
    Empty,
    /// Markup source (markdown).
    Markup(String),
    /// An arbitrary value, rendered as its string form.
    Value(serde_json::Value),
    /// A block, used as-is.
    Block(Block),
    /// A plain callable.
    Lazy(LazyFn),
    /// A callable that keeps emitting after its first pass.
    Dynamic(DynamicFn),
}

impl Emitted {
    /// A plain-text emission (not markup). Consecutive plain-text
    /// emissions coalesce into one accumulated block at the
    /// destination.
    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Block(Block::text(text))
    }

    /// Wraps a plain callable.
    #[must_use]
    pub fn lazy(f: impl FnOnce() -> Option<Emitted> + Send + 'static) -> Self {
        Self::Lazy(Box::new(f))
    }

    /// Wraps a dynamic callable.
    #[must_use]
    pub fn dynamic(f: impl FnOnce() -> Option<Emitted> + Send + 'static) -> Self {
        Self::Dynamic(Box::new(f))
    }
}

impl std::fmt::Debug for Emitted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str("Emitted::Empty"),
            Self::Markup(s) => f.debug_tuple("Emitted::Markup").field(s).finish(),
            Self::Value(v) => f.debug_tuple("Emitted::Value").field(v).finish(),
            Self::Block(b) => f.debug_tuple("Emitted::Block").field(&b.kind()).finish(),
            Self::Lazy(_) => f.write_str("Emitted::Lazy"),
            Self::Dynamic(_) => f.write_str("Emitted::Dynamic"),
        }
    }
}

impl From<&str> for Emitted {
    fn from(value: &str) -> Self {
        Self::Markup(value.to_string())
    }
}

impl From<String> for Emitted {
    fn from(value: String) -> Self {
        Self::Markup(value)
    }
}

impl From<Block> for Emitted {
    fn from(value: Block) -> Self {
        Self::Block(value)
    }
}

impl From<serde_json::Value> for Emitted {
    fn from(value: serde_json::Value) -> Self {
        Self::Value(value)
    }
}

impl From<()> for Emitted {
    fn from((): ()) -> Self {
        Self::Empty
    }
}

/// Outcome of [`coerce`].
///
/// Callables cannot become a block directly: their capture must be
/// resolved first, which needs the engine's scope machinery. The
/// resolver handles the two callable arms; everything else is a block.
pub enum Coerced {
    /// A block, ready to build.
    Block(Block),
    /// A plain callable to run inside a fresh capture scope.
    Lazy(LazyFn),
    /// A dynamic callable to run inside a kept-alive capture scope.
    Dynamic(DynamicFn),
}

/// The shared, total coercion rule.
///
/// Deterministic and never fails. Blocks are a fixed point: coercing an
/// already-coerced block yields the same block.
#[must_use]
pub fn coerce(item: Emitted) -> Coerced {
    match item {
        Emitted::Empty => Coerced::Block(Block::text("")),
        Emitted::Markup(source) => Coerced::Block(Block::markup(source)),
        Emitted::Value(value) => Coerced::Block(Block::text(value_to_text(&value))),
        Emitted::Block(block) => Coerced::Block(block),
        Emitted::Lazy(f) => Coerced::Lazy(f),
        Emitted::Dynamic(f) => Coerced::Dynamic(f),
    }
}

/// String form of a raw value. Strings render without quotes; anything
/// else renders as compact JSON.
fn value_to_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
