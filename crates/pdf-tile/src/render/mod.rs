//! PDF rendering modules for tile export
//!
//! This module handles all PDF-specific operations:
//! - Reading page boxes, rotation and inherited attributes
//! - Creating clipped XObjects from source pages
//! - Building one-page tile documents
//! - Deep copying PDF objects

mod page;
mod xobject;

pub use page::render_tile_document;
pub use xobject::{copy_object_deep, create_region_xobject, inherited_attribute, page_frame};
