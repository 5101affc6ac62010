//! Tile export - one PDF per mask
//!
//! This module orchestrates the export process:
//! 1. Resolve the source page and its visible frame
//! 2. Map each mask into the page's user space
//! 3. Render a one-page tile document per mask
//! 4. Write the tiles as `{base}_part_{index:03}.pdf`, in mask-list order
//!
//! Tiles are independent: a failed write leaves earlier tiles in place. What
//! happens to later tiles is chosen by [`FailurePolicy`].

mod io;
mod region;

pub use io::{SourceDocument, load_pdf, save_pdf};
pub use region::{PageFrame, PageRotation, UserRect};

use crate::constants::{OUTPUT_EXTENSION, PART_SEPARATOR};
use crate::masks::{Mask, MaskId};
use crate::options::{ExportOptions, FailurePolicy};
use crate::render::render_tile_document;
use crate::types::*;
use io::document_bytes;
use lopdf::{Document, ObjectId};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::task::JoinSet;

/// Output file name for the tile at a 1-based position in the mask list
pub fn tile_file_name(base_name: &str, index: usize) -> String {
    format!("{base_name}{PART_SEPARATOR}{index:03}.{OUTPUT_EXTENSION}")
}

/// Cooperative cancellation for a running export.
///
/// Tiles already being written finish; tiles not yet started are skipped.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear a previous cancellation so the token can be reused
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// A tile written to disk
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedTile {
    /// 1-based position in the mask list
    pub index: usize,
    pub mask_id: MaskId,
    pub path: PathBuf,
}

/// A tile that could not be written
#[derive(Debug, Clone, PartialEq)]
pub struct FailedTile {
    /// 1-based position in the mask list
    pub index: usize,
    pub mask_id: MaskId,
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of an export, in mask-list order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportReport {
    pub written: Vec<ExportedTile>,
    pub failed: Vec<FailedTile>,
    /// Tiles never started (cancelled, or stopped after a failure)
    pub skipped: usize,
}

impl ExportReport {
    /// Paths of the written tiles, in mask-list order
    pub fn paths(&self) -> Vec<PathBuf> {
        self.written.iter().map(|tile| tile.path.clone()).collect()
    }

    /// Whether every tile was written
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.skipped == 0
    }
}

/// Export one PDF per mask from a page of `source` into `output_dir`
pub async fn export_tiles(
    source: &SourceDocument,
    page_index: usize,
    masks: &[Mask],
    output_dir: impl AsRef<Path>,
    options: &ExportOptions,
) -> Result<ExportReport> {
    export_tiles_with(
        source,
        page_index,
        masks,
        output_dir,
        options,
        &CancelToken::new(),
        |_, _| {},
    )
    .await
}

/// Everything a single tile job needs, detached from the caller's borrows
struct TileJob {
    index: usize,
    mask_id: MaskId,
    path: PathBuf,
    region: UserRect,
}

/// Export with cancellation and progress reporting.
///
/// `on_progress` receives `(finished, total)` after each tile completes,
/// successfully or not.
pub async fn export_tiles_with(
    source: &SourceDocument,
    page_index: usize,
    masks: &[Mask],
    output_dir: impl AsRef<Path>,
    options: &ExportOptions,
    cancel: &CancelToken,
    mut on_progress: impl FnMut(usize, usize),
) -> Result<ExportReport> {
    options.validate()?;

    let page_id = source
        .page_id(page_index)
        .ok_or(TileError::InvalidPageIndex {
            index: page_index,
            page_count: source.page_count(),
        })?;
    if source.document().get_dictionary(page_id).is_err() {
        return Err(TileError::NotLoaded);
    }
    let frame = source.page_frame(page_index).ok_or(TileError::NotLoaded)?;

    let total = masks.len();
    if total == 0 {
        return Ok(ExportReport::default());
    }

    let output_dir = output_dir.as_ref().to_owned();
    tokio::fs::create_dir_all(&output_dir).await?;

    let base_name = options
        .base_name
        .clone()
        .unwrap_or_else(|| source.base_name());
    let page_bounds = frame.geometry().bounds();

    let jobs: Vec<TileJob> = masks
        .iter()
        .enumerate()
        .map(|(i, mask)| {
            if mask.rect.intersection(&page_bounds).is_none() {
                log::warn!("{} lies outside the page and will export blank", mask);
            }
            TileJob {
                index: i + 1,
                mask_id: mask.id,
                path: output_dir.join(tile_file_name(&base_name, i + 1)),
                region: frame.to_user_space(&mask.rect),
            }
        })
        .collect();

    log::info!(
        "Exporting {} tiles from page {} to {}",
        total,
        page_index + 1,
        output_dir.display()
    );

    let mut outcomes: Vec<Option<std::result::Result<(), String>>> = vec![None; total];
    let mut tasks = JoinSet::new();
    let mut finished = 0;
    let mut stopped = false;
    let document = source.shared_document();

    for job in &jobs {
        // Keep at most `max_concurrency` tiles in flight
        while tasks.len() >= options.max_concurrency {
            if let Some(joined) = tasks.join_next().await {
                let (slot, result) = joined?;
                stopped |= record_outcome(&jobs, &mut outcomes, slot, result, options);
                finished += 1;
                on_progress(finished, total);
            }
        }

        if stopped || cancel.is_cancelled() {
            break;
        }

        let slot = job.index - 1;
        let document = Arc::clone(&document);
        let path = job.path.clone();
        let region = job.region;
        tasks.spawn(async move {
            let result = write_tile(document, page_id, frame, region, path).await;
            (slot, result)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let (slot, result) = joined?;
        record_outcome(&jobs, &mut outcomes, slot, result, options);
        finished += 1;
        on_progress(finished, total);
    }

    let mut report = ExportReport::default();
    for (job, outcome) in jobs.into_iter().zip(outcomes) {
        match outcome {
            Some(Ok(())) => report.written.push(ExportedTile {
                index: job.index,
                mask_id: job.mask_id,
                path: job.path,
            }),
            Some(Err(error)) => report.failed.push(FailedTile {
                index: job.index,
                mask_id: job.mask_id,
                path: job.path,
                error,
            }),
            None => report.skipped += 1,
        }
    }

    log::info!(
        "Export finished: {} written, {} failed, {} skipped",
        report.written.len(),
        report.failed.len(),
        report.skipped
    );

    Ok(report)
}

/// Store a finished tile's result. Returns `true` if no further tiles should start.
fn record_outcome(
    jobs: &[TileJob],
    outcomes: &mut [Option<std::result::Result<(), String>>],
    slot: usize,
    result: Result<()>,
    options: &ExportOptions,
) -> bool {
    let job = &jobs[slot];
    match result {
        Ok(()) => {
            log::debug!("Wrote {}", job.path.display());
            outcomes[slot] = Some(Ok(()));
            false
        }
        Err(e) => {
            log::error!("Failed to write {}: {}", job.path.display(), e);
            outcomes[slot] = Some(Err(e.to_string()));
            options.failure_policy == FailurePolicy::StopOnFirstError
        }
    }
}

/// Render one tile on the blocking pool and write it out
async fn write_tile(
    document: Arc<Document>,
    page_id: ObjectId,
    frame: PageFrame,
    region: UserRect,
    path: PathBuf,
) -> Result<()> {
    let bytes = tokio::task::spawn_blocking(move || {
        let tile = render_tile_document(&document, page_id, &frame, &region)?;
        document_bytes(tile)
    })
    .await??;
    tokio::fs::write(&path, bytes).await?;
    Ok(())
}
