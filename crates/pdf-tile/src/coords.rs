//! Page space <-> display space conversion
//!
//! Display space is page space scaled uniformly by a zoom factor. Both spaces
//! share the top-left origin, so the mapping is a pure scale.

use crate::types::{Point, Rect};

/// Map a page-space point into display space
#[inline]
pub fn to_display(point: Point, zoom: f64) -> Point {
    debug_assert!(zoom > 0.0, "zoom must be positive");
    Point::new(point.x * zoom, point.y * zoom)
}

/// Map a display-space point back into page space
#[inline]
pub fn to_page(point: Point, zoom: f64) -> Point {
    debug_assert!(zoom > 0.0, "zoom must be positive");
    Point::new(point.x / zoom, point.y / zoom)
}

/// Map a page-space rectangle into display space
pub fn rect_to_display(rect: Rect, zoom: f64) -> Rect {
    let origin = to_display(Point::new(rect.x, rect.y), zoom);
    Rect::new(origin.x, origin.y, rect.width * zoom, rect.height * zoom)
}

/// Map a display-space rectangle back into page space
pub fn rect_to_page(rect: Rect, zoom: f64) -> Rect {
    let origin = to_page(Point::new(rect.x, rect.y), zoom);
    Rect::new(origin.x, origin.y, rect.width / zoom, rect.height / zoom)
}
