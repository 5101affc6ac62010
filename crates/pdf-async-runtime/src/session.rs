use crate::{QueuedCommand, TileCommand, TileUpdate};
use pdf_tile::formats::lookup;
use pdf_tile::{
    CancelToken, ExportOptions, MaskModel, SourceDocument, TileError, TilingConfig, detect_format,
    export_tiles_with, generate_masks, load_pdf,
};
use std::path::PathBuf;
use tokio::sync::mpsc;

/// State owned by the worker: the document, the current page and its masks
struct Session {
    source: Option<SourceDocument>,
    page_index: usize,
    masks: MaskModel,
    update_tx: mpsc::UnboundedSender<TileUpdate>,
}

/// Async worker task that processes tiling commands and sends updates
pub(crate) async fn worker_task(
    mut command_rx: mpsc::UnboundedReceiver<QueuedCommand>,
    update_tx: mpsc::UnboundedSender<TileUpdate>,
) {
    let mut session = Session {
        source: None,
        page_index: 0,
        masks: MaskModel::new(),
        update_tx,
    };

    let mut pending = None;
    loop {
        let queued = match pending.take() {
            Some(queued) => queued,
            None => match command_rx.recv().await {
                Some(queued) => queued,
                None => break,
            },
        };

        if let TileCommand::Generate { mut config } = queued.command {
            // Coalesce consecutive generate requests, keeping only the most recent
            while let Ok(next_cmd) = command_rx.try_recv() {
                if let TileCommand::Generate { config: newer } = next_cmd.command {
                    log::debug!("Discarding queued grid generation, using newer request");
                    config = newer;
                } else {
                    pending = Some(next_cmd);
                    break;
                }
            }
            session.generate(&config);
            continue;
        }

        if !session.process(queued.command, queued.cancel).await {
            break;
        }
    }

    log::debug!("Session worker stopped");
}

impl Session {
    /// Handle one command. Returns `false` when the worker should stop.
    async fn process(&mut self, cmd: TileCommand, cancel: Option<CancelToken>) -> bool {
        match cmd {
            TileCommand::Load { path } => self.load(path).await,
            TileCommand::SelectPage { page_index } => self.select_page(page_index),
            TileCommand::Generate { config } => self.generate(&config),
            TileCommand::AddMask {
                format,
                landscape,
                placement,
            } => match lookup(&format) {
                Some(spec) => {
                    self.masks.add(spec, landscape, placement);
                    self.send_masks();
                }
                None => self.send_error(format!("Unknown format '{format}'")),
            },
            TileCommand::RemoveMask { id } => {
                if self.masks.remove(id) {
                    self.send_masks();
                }
            }
            TileCommand::RemoveSelected => {
                if self.masks.remove_selected().is_some() {
                    self.send_masks();
                }
            }
            TileCommand::RotateMask { id } => {
                if self.masks.rotate(id).is_some() {
                    self.send_masks();
                }
            }
            TileCommand::RotateSelected => {
                if self.masks.rotate_selected().is_some() {
                    self.send_masks();
                }
            }
            TileCommand::MoveMask { id, dx, dy } => {
                if self.masks.move_by(id, dx, dy).is_some() {
                    self.send_masks();
                }
            }
            TileCommand::Select { id } => {
                if self.masks.select(id) {
                    self.send_masks();
                }
            }
            TileCommand::SelectAt { point } => {
                self.masks.select_at(point);
                self.send_masks();
            }
            TileCommand::Deselect => {
                self.masks.deselect();
                self.send_masks();
            }
            TileCommand::ClearMasks => {
                self.masks.clear();
                self.send_masks();
            }
            TileCommand::Export {
                output_dir,
                options,
            } => {
                self.export(output_dir, options, &cancel.unwrap_or_default()).await
            }
            TileCommand::Close => {
                self.source = None;
                self.masks.clear();
                let _ = self.update_tx.send(TileUpdate::Closed);
                return false;
            }
        }
        true
    }

    async fn load(&mut self, path: PathBuf) {
        match load_pdf(&path).await {
            Ok(source) => {
                let Some(page) = source.page_size_pt(0) else {
                    self.send_error(format!("{} has no pages", path.display()));
                    return;
                };
                let page_count = source.page_count();
                self.source = Some(source);
                self.page_index = 0;
                self.masks.clear();

                let _ = self.update_tx.send(TileUpdate::Loaded {
                    path,
                    page_count,
                    page_index: 0,
                    page,
                    format: detect_format(page).map(|f| f.name),
                });
                self.send_masks();
            }
            Err(e) => self.send_error(e.to_string()),
        }
    }

    fn select_page(&mut self, page_index: usize) {
        let Some(source) = &self.source else {
            self.send_error(TileError::NotLoaded.to_string());
            return;
        };
        let Some(page) = source.page_size_pt(page_index) else {
            self.send_error(
                TileError::InvalidPageIndex {
                    index: page_index,
                    page_count: source.page_count(),
                }
                .to_string(),
            );
            return;
        };

        // Masks are laid out in one page's space and do not carry over
        self.page_index = page_index;
        self.masks.clear();
        let _ = self.update_tx.send(TileUpdate::PageSelected {
            page_index,
            page,
            format: detect_format(page).map(|f| f.name),
        });
        self.send_masks();
    }

    fn generate(&mut self, config: &TilingConfig) {
        let Some(page) = self
            .source
            .as_ref()
            .and_then(|source| source.page_size_pt(self.page_index))
        else {
            self.send_error(TileError::NotLoaded.to_string());
            return;
        };

        match generate_masks(page, config) {
            Ok(tiles) => {
                self.masks.set_all(tiles);
                log::info!("Generated {} masks", self.masks.len());
                self.send_masks();
            }
            Err(e) => self.send_error(e.to_string()),
        }
    }

    async fn export(
        &mut self,
        output_dir: PathBuf,
        options: ExportOptions,
        cancel: &CancelToken,
    ) {
        let Some(source) = &self.source else {
            self.send_error(TileError::NotLoaded.to_string());
            return;
        };

        let masks = self.masks.snapshot();
        let progress_tx = self.update_tx.clone();
        let result = export_tiles_with(
            source,
            self.page_index,
            &masks,
            &output_dir,
            &options,
            cancel,
            move |current, total| {
                let _ = progress_tx.send(TileUpdate::Progress {
                    operation: "Exporting tiles".to_string(),
                    current,
                    total,
                });
            },
        )
        .await;

        match result {
            Ok(report) => {
                let _ = self.update_tx.send(TileUpdate::ExportComplete { report });
            }
            Err(e) => self.send_error(format!("Export failed: {e}")),
        }
    }

    fn send_masks(&self) {
        let _ = self.update_tx.send(TileUpdate::MasksChanged {
            masks: self.masks.snapshot(),
            selected: self.masks.selected_id(),
        });
    }

    fn send_error(&self, message: String) {
        log::warn!("{}", message);
        let _ = self.update_tx.send(TileUpdate::Error { message });
    }
}
