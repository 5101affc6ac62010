//! Shared constants for tiling and export
//!
//! This module centralizes magic numbers used by format detection,
//! grid generation and the exporter.

// =============================================================================
// Unit Conversion
// =============================================================================

/// Points per millimeter, as used for all sheet-format conversions
pub const POINTS_PER_MM: f64 = 2.83465;

/// Convert millimeters to points
#[inline]
pub fn mm_to_pt(mm: f64) -> f64 {
    mm * POINTS_PER_MM
}

/// Convert points to millimeters
#[inline]
pub fn pt_to_mm(pt: f64) -> f64 {
    pt / POINTS_PER_MM
}

// =============================================================================
// Format Detection
// =============================================================================

/// Maximum relative difference per edge for a page to match a sheet format
pub const FORMAT_TOLERANCE: f64 = 0.05;

/// Format used when a tile format name is not in the catalog
pub const FALLBACK_FORMAT: &str = "A4";

// =============================================================================
// Tiling Defaults
// =============================================================================

/// Default overlap between adjacent tiles, in percent of the tile edge
pub const DEFAULT_OVERLAP_PERCENT: f64 = 15.0;

/// Largest grid (columns x rows) a single generation request may produce
pub const MAX_TILES: usize = 10_000;

// =============================================================================
// Export
// =============================================================================

/// Separator between the source base name and the tile index
pub const PART_SEPARATOR: &str = "_part_";

/// File extension of exported tiles
pub const OUTPUT_EXTENSION: &str = "pdf";

/// PDF version of exported tile documents
pub const OUTPUT_PDF_VERSION: &str = "1.7";

/// Name of the source-page XObject inside each tile
pub const TILE_XOBJECT_NAME: &str = "Src";

/// Default page size when a source page has no MediaBox (US Letter)
pub const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];
