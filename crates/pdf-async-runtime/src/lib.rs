use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

mod session;

// Re-export types from the library crate
pub use pdf_tile::{
    CancelToken, ExportOptions, ExportReport, Mask, MaskId, PageGeometry, Placement, Point,
    TilingConfig,
};

/// Commands sent from the UI to the session worker
#[derive(Debug, Clone)]
pub enum TileCommand {
    /// Load a PDF and select its first page. Clears all masks.
    Load {
        path: PathBuf,
    },
    SelectPage {
        page_index: usize,
    },
    /// Replace all masks with a fresh grid for the current page
    Generate {
        config: TilingConfig,
    },
    AddMask {
        format: String,
        landscape: bool,
        placement: Placement,
    },
    RemoveMask {
        id: MaskId,
    },
    RemoveSelected,
    RotateMask {
        id: MaskId,
    },
    RotateSelected,
    MoveMask {
        id: MaskId,
        dx: f64,
        dy: f64,
    },
    Select {
        id: MaskId,
    },
    SelectAt {
        point: Point,
    },
    Deselect,
    ClearMasks,
    Export {
        output_dir: PathBuf,
        options: ExportOptions,
    },
    /// Drop the document and stop the worker
    Close,
}

/// Updates sent from the session worker to the UI
#[derive(Debug, Clone)]
pub enum TileUpdate {
    Loaded {
        path: PathBuf,
        page_count: usize,
        page_index: usize,
        page: PageGeometry,
        /// Detected sheet format of the page, if any
        format: Option<&'static str>,
    },
    PageSelected {
        page_index: usize,
        page: PageGeometry,
        format: Option<&'static str>,
    },
    /// Full mask list after any change
    MasksChanged {
        masks: Vec<Mask>,
        selected: Option<MaskId>,
    },
    Progress {
        operation: String,
        current: usize,
        total: usize,
    },
    ExportComplete {
        report: ExportReport,
    },
    Error {
        message: String,
    },
    Closed,
}

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Session worker has stopped")]
    SessionClosed,

    #[error("Session worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// A command on its way to the worker. Exports carry their own cancel token.
#[derive(Debug)]
pub(crate) struct QueuedCommand {
    pub(crate) command: TileCommand,
    pub(crate) cancel: Option<CancelToken>,
}

/// Handle to a running tiling session.
///
/// The worker owns the document and mask model; the handle only sends
/// commands and receives updates.
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<QueuedCommand>,
    updates: mpsc::UnboundedReceiver<TileUpdate>,
    /// Token of the most recently sent export
    cancel: Mutex<CancelToken>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub fn send(&self, command: TileCommand) -> Result<(), RuntimeError> {
        let cancel = match command {
            TileCommand::Export { .. } => {
                let token = CancelToken::new();
                if let Ok(mut current) = self.cancel.lock() {
                    *current = token.clone();
                }
                Some(token)
            }
            _ => None,
        };

        self.commands
            .send(QueuedCommand { command, cancel })
            .map_err(|_| RuntimeError::SessionClosed)
    }

    /// Wait for the next update. `None` once the worker has stopped.
    pub async fn recv(&mut self) -> Option<TileUpdate> {
        self.updates.recv().await
    }

    pub fn try_recv(&mut self) -> Option<TileUpdate> {
        self.updates.try_recv().ok()
    }

    /// Cancel the most recently sent export, whether it is still queued or
    /// running. Tiles already in flight finish.
    pub fn cancel_export(&self) {
        if let Ok(current) = self.cancel.lock() {
            current.cancel();
        }
    }

    /// Close the session and wait for the worker to finish
    pub async fn shutdown(self) -> Result<(), RuntimeError> {
        // The worker may already be gone after an earlier Close
        let _ = self.commands.send(QueuedCommand {
            command: TileCommand::Close,
            cancel: None,
        });
        drop(self.commands);
        self.task.await?;
        Ok(())
    }
}

/// Start a session worker on the current tokio runtime
pub fn spawn_session() -> SessionHandle {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (update_tx, update_rx) = mpsc::unbounded_channel();

    let task = tokio::spawn(session::worker_task(command_rx, update_tx));

    SessionHandle {
        commands: command_tx,
        updates: update_rx,
        cancel: Mutex::new(CancelToken::new()),
        task,
    }
}
