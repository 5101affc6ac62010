//! Source document access

use super::region::PageFrame;
use crate::render::page_frame;
use crate::types::*;
use lopdf::{Document, ObjectId};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A loaded source PDF and the path it came from
#[derive(Debug, Clone)]
pub struct SourceDocument {
    document: Arc<Document>,
    path: PathBuf,
    page_ids: Vec<ObjectId>,
}

impl SourceDocument {
    /// Wrap an already parsed document. `path` only supplies the output base name.
    pub fn from_document(document: Document, path: impl Into<PathBuf>) -> Self {
        let page_ids = document.get_pages().values().copied().collect();
        Self {
            document: Arc::new(document),
            path: path.into(),
            page_ids,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub(crate) fn shared_document(&self) -> Arc<Document> {
        Arc::clone(&self.document)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Source file name without directory or extension
    pub fn base_name(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.is_empty())
            .unwrap_or_else(|| "document".to_string())
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    pub(crate) fn page_id(&self, index: usize) -> Option<ObjectId> {
        self.page_ids.get(index).copied()
    }

    /// Visible box and rotation of a page (0-based index)
    pub fn page_frame(&self, index: usize) -> Option<PageFrame> {
        let page_id = self.page_id(index)?;
        Some(page_frame(&self.document, page_id))
    }

    /// Displayed page size in points, or `None` if `index` is out of range
    pub fn page_size_pt(&self, index: usize) -> Option<PageGeometry> {
        self.page_frame(index).map(|frame| frame.geometry())
    }
}

/// Load a PDF document from disk
pub async fn load_pdf(path: impl AsRef<Path>) -> Result<SourceDocument> {
    let path = path.as_ref().to_owned();
    let bytes = tokio::fs::read(&path).await.map_err(|e| TileError::Load {
        path: path.clone(),
        source: e.into(),
    })?;

    let load_path = path.clone();
    let document = tokio::task::spawn_blocking(move || Document::load_mem(&bytes))
        .await?
        .map_err(|e| TileError::Load {
            path: load_path,
            source: e.into(),
        })?;

    log::info!(
        "Loaded {} ({} pages)",
        path.display(),
        document.get_pages().len()
    );
    Ok(SourceDocument::from_document(document, path))
}

/// Serialize a document into memory
pub(crate) fn document_bytes(mut doc: Document) -> Result<Vec<u8>> {
    let mut writer = Vec::new();
    doc.save_to(&mut writer)?;
    Ok(writer)
}

/// Save a document to disk
pub async fn save_pdf(doc: Document, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref().to_owned();
    let bytes = tokio::task::spawn_blocking(move || document_bytes(doc)).await??;
    tokio::fs::write(&path, bytes).await?;
    Ok(())
}
