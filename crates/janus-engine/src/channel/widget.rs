//! Widget channel - retained widget values.
//!
//! Artifacts are plain widget values the surface owner keeps alive and
//! mutates in place on command: a [`Widget`] is what a graphical host
//! turns into its own controls. Streams and regions carry their stable
//! identities so the host can address exactly one subtree when a live
//! append or an in-place replacement arrives.

use super::{Artifact, ChannelContext};
use crate::ExecutionFailure;
use janus_types::{RegionId, StreamId};
use serde::Serialize;

/// A retained widget value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Widget {
    /// Plain selectable text.
    Text {
        /// Content.
        content: String,
    },
    /// Markdown content, rendered by the host.
    Markdown {
        /// Markdown source.
        source: String,
    },
    /// Horizontal layout.
    Row {
        /// Children, left to right.
        children: Vec<Widget>,
    },
    /// Vertical layout.
    Column {
        /// Children, top to bottom.
        children: Vec<Widget>,
    },
    /// Tabular data.
    Table {
        /// Column headers.
        columns: Vec<String>,
        /// Row cells.
        rows: Vec<Vec<String>>,
    },
    /// A container receiving live children from a dynamic producer.
    Stream {
        /// Container identity for live appends.
        id: StreamId,
        /// Children present at resolution time.
        children: Vec<Widget>,
    },
    /// A dynamic region, replaced in place when bound state changes.
    Region {
        /// Stable region identity.
        id: RegionId,
        /// Current render.
        children: Vec<Widget>,
    },
    /// An error panel: message plus formatted trace.
    ErrorPanel {
        /// One-line message.
        message: String,
        /// Formatted detail, possibly empty.
        trace: String,
    },
}

impl Artifact for Widget {
    fn as_plain_text(&self) -> Option<&str> {
        match self {
            Self::Text { content } => Some(content),
            _ => None,
        }
    }

    fn display_text(&self) -> String {
        match self {
            Self::Text { content } => content.clone(),
            Self::Markdown { source } => source.clone(),
            Self::Row { children } => {
                let parts: Vec<String> = children.iter().map(Artifact::display_text).collect();
                parts.join("  ")
            }
            Self::Column { children }
            | Self::Stream { children, .. }
            | Self::Region { children, .. } => {
                let parts: Vec<String> = children.iter().map(Artifact::display_text).collect();
                parts.join("\n")
            }
            Self::Table { columns, rows } => {
                let mut lines = vec![columns.join(" | ")];
                lines.extend(rows.iter().map(|row| row.join(" | ")));
                lines.join("\n")
            }
            Self::ErrorPanel { message, trace } => {
                if trace.is_empty() {
                    format!("ERROR: {message}")
                } else {
                    format!("ERROR: {message}\n{trace}")
                }
            }
        }
    }
}

/// The widget channel.
#[derive(Debug, Default, Clone, Copy)]
pub struct WidgetChannel;

impl WidgetChannel {
    /// Creates the widget channel context.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ChannelContext for WidgetChannel {
    type Artifact = Widget;

    fn name(&self) -> &'static str {
        "widget"
    }

    fn plain(&self, text: &str) -> Widget {
        Widget::Text {
            content: text.to_string(),
        }
    }

    fn markup(&self, source: &str) -> Widget {
        Widget::Markdown {
            source: source.to_string(),
        }
    }

    fn group(&self, children: Vec<Widget>) -> Widget {
        Widget::Column { children }
    }

    fn row(&self, children: Vec<Widget>) -> Widget {
        Widget::Row { children }
    }

    fn column(&self, children: Vec<Widget>) -> Widget {
        Widget::Column { children }
    }

    fn table(&self, columns: &[String], rows: &[Vec<String>]) -> Widget {
        Widget::Table {
            columns: columns.to_vec(),
            rows: rows.to_vec(),
        }
    }

    fn stream(&self, id: StreamId, children: Vec<Widget>) -> Widget {
        Widget::Stream { id, children }
    }

    fn region(&self, id: RegionId, children: Vec<Widget>) -> Widget {
        Widget::Region { id, children }
    }

    fn error(&self, failure: &ExecutionFailure) -> Widget {
        Widget::ErrorPanel {
            message: failure.message.clone(),
            trace: failure.trace.clone(),
        }
    }
}
