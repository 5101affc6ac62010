//! Mapping page-space rectangles into PDF user space
//!
//! Page space is what a viewer shows: origin at the top-left of the visible
//! box, y growing downward, with the page's `/Rotate` already applied. PDF
//! content lives in unrotated user space with a bottom-left origin. The
//! exporter needs the user-space clip rectangle for each mask.

use crate::types::{PageGeometry, Rect};

/// Clockwise page rotation as stored in `/Rotate`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageRotation {
    #[default]
    None,
    Clockwise90,
    Clockwise180,
    Clockwise270,
}

impl PageRotation {
    /// Normalize a `/Rotate` value. Values that are not multiples of 90 are
    /// invalid PDF and treated as unrotated.
    pub fn from_degrees(degrees: i64) -> Self {
        match degrees.rem_euclid(360) {
            90 => PageRotation::Clockwise90,
            180 => PageRotation::Clockwise180,
            270 => PageRotation::Clockwise270,
            0 => PageRotation::None,
            other => {
                log::warn!("Ignoring invalid page rotation of {other} degrees");
                PageRotation::None
            }
        }
    }

    pub fn degrees(self) -> i64 {
        match self {
            PageRotation::None => 0,
            PageRotation::Clockwise90 => 90,
            PageRotation::Clockwise180 => 180,
            PageRotation::Clockwise270 => 270,
        }
    }

    /// Whether the displayed page has width and height swapped
    pub fn is_quarter_turn(self) -> bool {
        matches!(self, PageRotation::Clockwise90 | PageRotation::Clockwise270)
    }
}

/// A rectangle in PDF user space (bottom-left origin)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UserRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl UserRect {
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.y + self.height
    }
}

/// The visible box of a source page and its rotation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFrame {
    /// Visible box in user space, normalized so `x`/`y` is the lower-left corner
    pub bounds: UserRect,
    pub rotation: PageRotation,
}

impl PageFrame {
    /// Build a frame from a `[llx lly urx ury]` box in any corner order
    pub fn from_box(coords: [f64; 4], rotation: PageRotation) -> Self {
        let [x0, y0, x1, y1] = coords;
        Self {
            bounds: UserRect {
                x: x0.min(x1),
                y: y0.min(y1),
                width: (x1 - x0).abs(),
                height: (y1 - y0).abs(),
            },
            rotation,
        }
    }

    /// Size of the page as displayed (rotation applied)
    pub fn geometry(&self) -> PageGeometry {
        if self.rotation.is_quarter_turn() {
            PageGeometry::new(self.bounds.height, self.bounds.width)
        } else {
            PageGeometry::new(self.bounds.width, self.bounds.height)
        }
    }

    /// Map a page-space rectangle to the user-space rectangle it displays.
    ///
    /// For quarter turns the result has width and height swapped relative to
    /// the input; the exporter restores the displayed orientation by carrying
    /// the source rotation over to the tile page.
    pub fn to_user_space(&self, rect: &Rect) -> UserRect {
        let b = &self.bounds;
        let (x, y, width, height) = match self.rotation {
            PageRotation::None => (rect.x, b.height - rect.bottom(), rect.width, rect.height),
            PageRotation::Clockwise90 => (rect.y, rect.x, rect.height, rect.width),
            PageRotation::Clockwise180 => {
                (b.width - rect.right(), rect.y, rect.width, rect.height)
            }
            PageRotation::Clockwise270 => (
                b.width - rect.bottom(),
                b.height - rect.right(),
                rect.height,
                rect.width,
            ),
        };

        UserRect {
            x: b.x + x,
            y: b.y + y,
            width,
            height,
        }
    }
}
