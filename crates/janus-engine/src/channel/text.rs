//! Text channel - line-oriented artifacts and the console renderer.
//!
//! Artifacts are formatted text blocks. Markup renders through
//! termimad; captured text keeps the unstyled source so records stay
//! free of escape sequences. The [`ConsoleRenderer`] is the surface
//! owner for this channel: it drains the surface port and prints;
//! nothing else writes to the terminal.

use super::{Artifact, ChannelContext};
use crate::surface::{SurfaceCommand, SurfaceReceiver};
use crate::ExecutionFailure;
use janus_types::{RegionId, StreamId};

/// A formatted text block.
#[derive(Debug, Clone, PartialEq)]
pub enum TextArtifact {
    /// One plain line (coalescible).
    Plain(String),
    /// Rendered markup: the source, and the terminal rendition.
    Rendered {
        /// Markup source, used for captured-text records.
        source: String,
        /// Terminal rendition (may contain styling escapes).
        rendered: String,
    },
    /// Stacked or inline children.
    Group {
        /// Child artifacts, in order.
        children: Vec<TextArtifact>,
        /// `true` renders children on one line (rows), `false` stacks
        /// them (groups, columns, streams, regions).
        inline: bool,
    },
    /// An error block: message plus formatted trace.
    Error {
        /// One-line message.
        message: String,
        /// Formatted detail, possibly empty.
        trace: String,
    },
}

impl TextArtifact {
    /// Terminal rendition, styling included.
    #[must_use]
    pub fn rendered_text(&self) -> String {
        match self {
            Self::Plain(line) => line.clone(),
            Self::Rendered { rendered, .. } => rendered.clone(),
            Self::Group { children, inline } => {
                let parts: Vec<String> = children.iter().map(Self::rendered_text).collect();
                parts.join(if *inline { "  " } else { "\n" })
            }
            Self::Error { message, trace } => {
                if trace.is_empty() {
                    format!("ERROR: {message}")
                } else {
                    format!("ERROR: {message}\n{trace}")
                }
            }
        }
    }
}

impl Artifact for TextArtifact {
    fn as_plain_text(&self) -> Option<&str> {
        match self {
            Self::Plain(line) => Some(line),
            _ => None,
        }
    }

    fn display_text(&self) -> String {
        match self {
            Self::Plain(line) => line.clone(),
            Self::Rendered { source, .. } => source.clone(),
            Self::Group { children, inline } => {
                let parts: Vec<String> = children.iter().map(Artifact::display_text).collect();
                parts.join(if *inline { "  " } else { "\n" })
            }
            Self::Error { message, trace } => {
                if trace.is_empty() {
                    format!("ERROR: {message}")
                } else {
                    format!("ERROR: {message}\n{trace}")
                }
            }
        }
    }
}

/// The text channel.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextChannel;

impl TextChannel {
    /// Creates the text channel context.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn render_markup(source: &str) -> String {
        let skin = termimad::MadSkin::default();
        skin.text(source, None).to_string().trim_end().to_string()
    }
}

impl ChannelContext for TextChannel {
    type Artifact = TextArtifact;

    fn name(&self) -> &'static str {
        "text"
    }

    fn plain(&self, text: &str) -> TextArtifact {
        TextArtifact::Plain(text.to_string())
    }

    fn markup(&self, source: &str) -> TextArtifact {
        TextArtifact::Rendered {
            source: source.to_string(),
            rendered: Self::render_markup(source),
        }
    }

    fn group(&self, children: Vec<TextArtifact>) -> TextArtifact {
        TextArtifact::Group {
            children,
            inline: false,
        }
    }

    fn row(&self, children: Vec<TextArtifact>) -> TextArtifact {
        TextArtifact::Group {
            children,
            inline: true,
        }
    }

    fn column(&self, children: Vec<TextArtifact>) -> TextArtifact {
        TextArtifact::Group {
            children,
            inline: false,
        }
    }

    fn table(&self, columns: &[String], rows: &[Vec<String>]) -> TextArtifact {
        // Tables go through the markup path: termimad renders markdown
        // tables with box drawing.
        let mut source = String::new();
        source.push_str(&format!("|{}|\n", columns.join("|")));
        source.push_str(&format!("|{}|\n", vec!["-"; columns.len()].join("|")));
        for row in rows {
            source.push_str(&format!("|{}|\n", row.join("|")));
        }
        self.markup(&source)
    }

    fn stream(&self, _id: StreamId, children: Vec<TextArtifact>) -> TextArtifact {
        TextArtifact::Group {
            children,
            inline: false,
        }
    }

    fn region(&self, _id: RegionId, children: Vec<TextArtifact>) -> TextArtifact {
        TextArtifact::Group {
            children,
            inline: false,
        }
    }

    fn error(&self, failure: &ExecutionFailure) -> TextArtifact {
        TextArtifact::Error {
            message: failure.message.clone(),
            trace: failure.trace.clone(),
        }
    }
}

/// Console renderer - the text channel's surface owner.
///
/// Drains the surface port and prints to stdout/stderr. A line-oriented
/// medium cannot mutate in place, so in-place commands degrade
/// faithfully: a text update prints only the newly absorbed line, a
/// region replacement prints the fresh render.
pub struct ConsoleRenderer {
    verbose: bool,
}

impl ConsoleRenderer {
    /// Creates a renderer.
    #[must_use]
    pub fn new() -> Self {
        Self { verbose: false }
    }

    /// Creates a renderer that also prints chrome-level commands.
    #[must_use]
    pub fn verbose() -> Self {
        Self { verbose: true }
    }

    /// Drains the receiver until every port is dropped.
    pub async fn run(self, mut rx: SurfaceReceiver<TextArtifact>) {
        while let Some(command) = rx.recv().await {
            self.render_command(&command);
        }
    }

    /// Renders a single surface command.
    pub fn render_command(&self, command: &SurfaceCommand<TextArtifact>) {
        match command {
            SurfaceCommand::Append { artifact, .. }
            | SurfaceCommand::StreamAppend { artifact, .. } => match artifact {
                TextArtifact::Error { .. } => eprintln!("{}", artifact.rendered_text()),
                other => println!("{}", other.rendered_text()),
            },
            SurfaceCommand::UpdateText { text, .. } => {
                // Only the newly absorbed line is new output.
                if let Some(line) = text.rsplit('\n').next() {
                    println!("{line}");
                }
            }
            SurfaceCommand::ReplaceRegion { artifact, .. } => {
                println!("{}", artifact.rendered_text());
            }
            SurfaceCommand::Clipboard { text } => {
                println!("[clipboard] {text}");
            }
            SurfaceCommand::Overlay { message } => {
                eprintln!("! {message}");
            }
            SurfaceCommand::SetVisible { key, visible } => {
                if self.verbose {
                    tracing::debug!(%key, visible, "view visibility");
                }
            }
            SurfaceCommand::SetRunEnabled { key, enabled } => {
                if self.verbose {
                    tracing::debug!(%key, enabled, "run control");
                }
            }
            SurfaceCommand::Clear { key } => {
                tracing::debug!(%key, "view cleared");
            }
            SurfaceCommand::ScrollToEnd { .. } => {}
        }
    }
}

impl Default for ConsoleRenderer {
    fn default() -> Self {
        Self::new()
    }
}
