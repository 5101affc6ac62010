//! Sheet format catalog
//!
//! Named ISO sheet formats (including the elongated A0 multiples used for
//! engineering drawings), page classification against them, and
//! format-to-size conversion for tiles.

use crate::constants::{FALLBACK_FORMAT, FORMAT_TOLERANCE, mm_to_pt};
use crate::types::{Orientation, PageGeometry};

/// A named sheet format with physical dimensions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormatSpec {
    /// Format identifier, e.g. "A4"
    pub name: &'static str,
    /// Long edge in millimeters
    pub long_mm: f64,
    /// Short edge in millimeters
    pub short_mm: f64,
}

impl FormatSpec {
    const fn new(name: &'static str, short_mm: f64, long_mm: f64) -> Self {
        Self {
            name,
            long_mm,
            short_mm,
        }
    }

    /// Portrait dimensions (width, height) in points
    pub fn size_pt(&self) -> (f64, f64) {
        (mm_to_pt(self.short_mm), mm_to_pt(self.long_mm))
    }

    /// Dimensions (width, height) in points with orientation applied
    pub fn size_with_orientation(&self, orientation: Orientation) -> (f64, f64) {
        orientation.apply(self.size_pt())
    }

    /// Whether a page of the given size (millimeters, any order) is this format
    fn matches_mm(&self, long_mm: f64, short_mm: f64) -> bool {
        (long_mm - self.long_mm).abs() / self.long_mm < FORMAT_TOLERANCE
            && (short_mm - self.short_mm).abs() / self.short_mm < FORMAT_TOLERANCE
    }
}

/// Registered formats. Detection takes the first match in this order.
pub const FORMATS: &[FormatSpec] = &[
    FormatSpec::new("A0", 841.0, 1189.0),
    FormatSpec::new("A0x2", 1189.0, 1682.0),
    FormatSpec::new("A0x3", 1189.0, 2523.0),
    FormatSpec::new("A1", 594.0, 841.0),
    FormatSpec::new("A2", 420.0, 594.0),
    FormatSpec::new("A3", 297.0, 420.0),
    FormatSpec::new("A4", 210.0, 297.0),
];

/// Look up a format by name (case-insensitive)
pub fn lookup(name: &str) -> Option<&'static FormatSpec> {
    FORMATS
        .iter()
        .find(|format| format.name.eq_ignore_ascii_case(name))
}

/// Portrait tile size in points for a format name.
///
/// Names missing from the catalog resolve to A4 instead of failing; callers
/// that need to reject unknown names should use [`lookup`].
pub fn format_size(name: &str) -> (f64, f64) {
    resolve(name).size_pt()
}

/// Resolve a format name, falling back to A4 for unknown names
pub fn resolve(name: &str) -> &'static FormatSpec {
    match lookup(name) {
        Some(format) => format,
        None => {
            log::warn!("Unknown sheet format '{name}', using {FALLBACK_FORMAT}");
            fallback()
        }
    }
}

fn fallback() -> &'static FormatSpec {
    FORMATS
        .iter()
        .find(|format| format.name == FALLBACK_FORMAT)
        .unwrap_or(&FORMATS[FORMATS.len() - 1])
}

/// Classify a page size given in millimeters. Edge order does not matter.
pub fn detect_format_mm(width_mm: f64, height_mm: f64) -> Option<&'static FormatSpec> {
    let (long_mm, short_mm) = if width_mm >= height_mm {
        (width_mm, height_mm)
    } else {
        (height_mm, width_mm)
    };

    FORMATS
        .iter()
        .find(|format| format.matches_mm(long_mm, short_mm))
}

/// Classify a page against the catalog.
///
/// Returns `None` when no format is within tolerance on both edges, which is
/// a normal outcome for non-standard drawings.
pub fn detect_format(page: PageGeometry) -> Option<&'static FormatSpec> {
    let (width_mm, height_mm) = page.size_mm();
    detect_format_mm(width_mm, height_mm)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_long_edge_first() {
        for format in FORMATS {
            assert!(format.long_mm >= format.short_mm, "{}", format.name);
        }
    }

    #[test]
    fn test_lookup_ignores_case() {
        assert_eq!(lookup("a3").map(|f| f.name), Some("A3"));
        assert_eq!(lookup("A0X2").map(|f| f.name), Some("A0x2"));
        assert!(lookup("B5").is_none());
    }

    #[test]
    fn test_unknown_name_falls_back_to_a4() {
        assert_eq!(format_size("Letter"), format_size("A4"));
        assert_eq!(resolve("").name, "A4");
    }

    #[test]
    fn test_first_match_wins() {
        // Exact A0 dimensions must not be reported as anything later in the list
        assert_eq!(detect_format_mm(841.0, 1189.0).map(|f| f.name), Some("A0"));
    }
}
