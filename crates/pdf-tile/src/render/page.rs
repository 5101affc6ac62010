//! Tile document rendering
//!
//! Each tile is a self-contained one-page document. The page's media box is
//! the tile region moved to the origin; the source page is drawn through a
//! clipped Form XObject translated by the region's lower-left corner.

use crate::constants::{OUTPUT_PDF_VERSION, TILE_XOBJECT_NAME};
use crate::export::{PageFrame, PageRotation, UserRect};
use crate::types::Result;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashMap;

use super::xobject::create_region_xobject;

/// Build a one-page document containing `region` of a source page.
///
/// The source rotation is carried over, so the tile displays upright with
/// the same width and height as the mask it was cut for.
pub fn render_tile_document(
    source: &Document,
    page_id: ObjectId,
    frame: &PageFrame,
    region: &UserRect,
) -> Result<Document> {
    let mut output = Document::with_version(OUTPUT_PDF_VERSION);
    let pages_id = output.new_object_id();
    let mut cache: HashMap<ObjectId, ObjectId> = HashMap::new();

    let xobject_id = create_region_xobject(&mut output, source, page_id, region, &mut cache)?;

    let mut xobjects = Dictionary::new();
    xobjects.set(TILE_XOBJECT_NAME, Object::Reference(xobject_id));
    let mut resources = Dictionary::new();
    resources.set("XObject", Object::Dictionary(xobjects));

    let content = placement_command(region);
    let content_id = output.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

    let mut page_dict = Dictionary::new();
    page_dict.set("Type", Object::Name(b"Page".to_vec()));
    page_dict.set("Parent", Object::Reference(pages_id));
    page_dict.set(
        "MediaBox",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(region.width as f32),
            Object::Real(region.height as f32),
        ]),
    );
    if frame.rotation != PageRotation::None {
        page_dict.set("Rotate", Object::Integer(frame.rotation.degrees()));
    }
    page_dict.set("Resources", Object::Dictionary(resources));
    page_dict.set("Contents", Object::Reference(content_id));
    let page_id = output.add_object(page_dict);

    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(vec![Object::Reference(page_id)])),
        ("Count", Object::Integer(1)),
    ]);
    output
        .objects
        .insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = output.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    output.trailer.set("Root", catalog_id);

    Ok(output)
}

/// Content stream that clips to the tile and draws the region at the origin
fn placement_command(region: &UserRect) -> String {
    format!(
        "q 0 0 {:.4} {:.4} re W n 1 0 0 1 {:.4} {:.4} cm /{} Do Q\n",
        region.width,
        region.height,
        -region.x,
        -region.y,
        TILE_XOBJECT_NAME
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_translates_region_to_origin() {
        let region = UserRect {
            x: 100.0,
            y: 250.5,
            width: 595.0,
            height: 842.0,
        };
        assert_eq!(
            placement_command(&region),
            "q 0 0 595.0000 842.0000 re W n 1 0 0 1 -100.0000 -250.5000 cm /Src Do Q\n"
        );
    }
}
