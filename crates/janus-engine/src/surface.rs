//! Surface port - marshaled access to the display surface.
//!
//! Only one thread-of-control owns the display surface. Everything
//! else (buffered callers, async tasks, background workers) describes
//! the mutation it wants as a [`SurfaceCommand`] and submits it through
//! a [`Surface`]. The port implementation forwards commands over an
//! mpsc channel to the owning task; submitting is non-blocking and safe
//! from any thread. This is a hard rule of the engine, not an
//! optimization: no producer ever touches display state directly.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  producers (coordinator, routers, region observers, workers)  │
//! │                 │ submit(SurfaceCommand)                      │
//! └─────────────────┼─────────────────────────────────────────────┘
//!                   ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │  SurfacePort ── mpsc ──► SurfaceReceiver                      │
//! │                          (drained by the surface owner:       │
//! │                           console renderer, widget host, …)   │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`RecordingSurface`] captures commands for tests and for headless
//! embedding.

use crate::EngineError;
use janus_types::{CellId, RegionId, StreamId, ViewKey};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

/// One display mutation, described channel-independently over the
/// channel's artifact type.
#[derive(Debug, Clone)]
pub enum SurfaceCommand<A> {
    /// Append a new cell to a view's destination.
    Append {
        /// Destination view.
        key: ViewKey,
        /// Identity of the new cell.
        cell: CellId,
        /// The artifact to present.
        artifact: A,
    },
    /// Update an accumulating text cell in place with its full text.
    UpdateText {
        /// Destination view.
        key: ViewKey,
        /// Identity of the accumulating cell.
        cell: CellId,
        /// Full accumulated text.
        text: String,
    },
    /// Replace a dynamic region's rendered subtree in place.
    ReplaceRegion {
        /// Destination view.
        key: ViewKey,
        /// Stable region identity.
        region: RegionId,
        /// The fresh render.
        artifact: A,
    },
    /// Append a live child to a streaming container.
    StreamAppend {
        /// Destination view.
        key: ViewKey,
        /// Container identity.
        stream: StreamId,
        /// The new child.
        artifact: A,
    },
    /// Show or hide a view.
    SetVisible {
        /// Target view.
        key: ViewKey,
        /// New visibility.
        visible: bool,
    },
    /// Enable or disable a view's run control.
    SetRunEnabled {
        /// Target view.
        key: ViewKey,
        /// New enablement.
        enabled: bool,
    },
    /// Clear a view's displayed output.
    Clear {
        /// Target view.
        key: ViewKey,
    },
    /// Scroll a view's destination to its end.
    ScrollToEnd {
        /// Target view.
        key: ViewKey,
    },
    /// Write text to the system clipboard.
    Clipboard {
        /// Text to copy.
        text: String,
    },
    /// Present an overlay/alert message.
    Overlay {
        /// Message to present.
        message: String,
    },
}

/// Submission side of the display surface.
pub trait Surface<A>: Send + Sync {
    /// Submits one mutation for the surface owner to apply.
    ///
    /// # Errors
    ///
    /// [`EngineError::SurfaceClosed`] when the owner is gone.
    fn submit(&self, command: SurfaceCommand<A>) -> Result<(), EngineError>;
}

/// Port half handed to producers; forwards commands to the owner.
pub struct SurfacePort<A> {
    tx: mpsc::UnboundedSender<SurfaceCommand<A>>,
}

impl<A> Clone for SurfacePort<A> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<A: Send + 'static> Surface<A> for SurfacePort<A> {
    fn submit(&self, command: SurfaceCommand<A>) -> Result<(), EngineError> {
        self.tx
            .send(command)
            .map_err(|_| EngineError::SurfaceClosed)
    }
}

/// Receiving half, owned by the task that owns the display surface.
pub struct SurfaceReceiver<A> {
    rx: mpsc::UnboundedReceiver<SurfaceCommand<A>>,
}

impl<A> SurfaceReceiver<A> {
    /// Receives the next command; `None` when every port is dropped.
    pub async fn recv(&mut self) -> Option<SurfaceCommand<A>> {
        self.rx.recv().await
    }

    /// Non-blocking receive, for owners embedded in a render loop.
    pub fn try_recv(&mut self) -> Option<SurfaceCommand<A>> {
        self.rx.try_recv().ok()
    }
}

/// Creates a connected port/receiver pair.
#[must_use]
pub fn surface_port<A>() -> (SurfacePort<A>, SurfaceReceiver<A>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SurfacePort { tx }, SurfaceReceiver { rx })
}

/// A surface that records every command, for tests and headless runs.
pub struct RecordingSurface<A> {
    commands: Arc<Mutex<Vec<SurfaceCommand<A>>>>,
}

impl<A> RecordingSurface<A> {
    /// Creates an empty recording surface.
    #[must_use]
    pub fn new() -> Self {
        Self {
            commands: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns a snapshot of the recorded commands.
    #[must_use]
    pub fn commands(&self) -> Vec<SurfaceCommand<A>>
    where
        A: Clone,
    {
        self.commands.lock().clone()
    }

    /// Returns how many commands were recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.lock().len()
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.lock().is_empty()
    }
}

impl<A> Default for RecordingSurface<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Clone for RecordingSurface<A> {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
        }
    }
}

impl<A: Send + 'static> Surface<A> for RecordingSurface<A> {
    fn submit(&self, command: SurfaceCommand<A>) -> Result<(), EngineError> {
        self.commands.lock().push(command);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn port_marshals_commands_to_the_receiver() {
        let (port, mut rx) = surface_port::<String>();
        let key = ViewKey::root("demo");

        // Submission is sync and thread-safe; do it from a worker.
        let worker_port = port.clone();
        let worker_key = key.clone();
        std::thread::spawn(move || {
            worker_port
                .submit(SurfaceCommand::Clear { key: worker_key })
                .unwrap();
        })
        .join()
        .unwrap();

        match rx.recv().await {
            Some(SurfaceCommand::Clear { key: received }) => assert_eq!(received, key),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn submitting_to_a_closed_surface_fails() {
        let (port, rx) = surface_port::<String>();
        drop(rx);
        assert!(matches!(
            port.submit(SurfaceCommand::Clipboard {
                text: "x".into()
            }),
            Err(EngineError::SurfaceClosed)
        ));
    }

    #[test]
    fn recording_surface_keeps_order() {
        let surface = RecordingSurface::<String>::new();
        surface
            .submit(SurfaceCommand::Overlay {
                message: "one".into(),
            })
            .unwrap();
        surface
            .submit(SurfaceCommand::Overlay {
                message: "two".into(),
            })
            .unwrap();
        let commands = surface.commands();
        assert_eq!(commands.len(), 2);
        assert!(matches!(&commands[0], SurfaceCommand::Overlay { message } if message == "one"));
    }
}
