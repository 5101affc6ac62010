//! Editable mask collection
//!
//! The model owns only geometry and identity. Operations that name a mask id
//! the model does not hold are no-ops: the interactive caller may act on a
//! mask that was removed a moment earlier.

use crate::coords;
use crate::formats::FormatSpec;
use crate::tiling::Tile;
use crate::types::*;
use std::fmt;

/// Stable mask identity within one model
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MaskId(pub u64);

impl fmt::Display for MaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A page region designated as one output tile, in page space (points)
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mask {
    pub id: MaskId,
    pub rect: Rect,
    pub landscape: bool,
    /// Grid cell the mask was generated for; `None` for manual masks
    pub grid: Option<GridPosition>,
}

impl Mask {
    pub fn x(&self) -> f64 {
        self.rect.x
    }

    pub fn y(&self) -> f64 {
        self.rect.y
    }

    pub fn width(&self) -> f64 {
        self.rect.width
    }

    pub fn height(&self) -> f64 {
        self.rect.height
    }

    pub fn orientation(&self) -> Orientation {
        Orientation::from_landscape(self.landscape)
    }

    /// Rectangle in display space at the given zoom
    pub fn display_rect(&self, zoom: f64) -> Rect {
        coords::rect_to_display(self.rect, zoom)
    }
}

impl fmt::Display for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let orientation = if self.landscape {
            "landscape"
        } else {
            "portrait"
        };
        write!(
            f,
            "Mask {} ({}) {:.1} x {:.1} pt at ({:.1}, {:.1})",
            self.id, orientation, self.rect.width, self.rect.height, self.rect.x, self.rect.y
        )
    }
}

/// Where a manually added mask goes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Top-left corner at a page-space point
    At(Point),
    /// Centered on a page-space point
    CenteredAt(Point),
    /// Centered in a display-space viewport shown at `zoom`
    CenteredInViewport { viewport: Rect, zoom: f64 },
}

impl Placement {
    fn rect_for(self, width: f64, height: f64) -> Rect {
        match self {
            Placement::At(origin) => Rect::new(origin.x, origin.y, width, height),
            Placement::CenteredAt(center) => Rect::centered_on(center, width, height),
            Placement::CenteredInViewport { viewport, zoom } => {
                let center = coords::to_page(viewport.center(), zoom);
                Rect::centered_on(center, width, height)
            }
        }
    }
}

/// Keep a mask from starting before the page's near edges
fn clamp_origin(mut rect: Rect) -> Rect {
    rect.x = rect.x.max(0.0);
    rect.y = rect.y.max(0.0);
    rect
}

/// Ordered mask collection with at most one selected mask
#[derive(Debug, Clone, Default)]
pub struct MaskModel {
    masks: Vec<Mask>,
    selected: Option<MaskId>,
    next_id: u64,
}

impl MaskModel {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> MaskId {
        self.next_id += 1;
        MaskId(self.next_id)
    }

    fn position(&self, id: MaskId) -> Option<usize> {
        self.masks.iter().position(|mask| mask.id == id)
    }

    /// Add a mask sized from `format` and place it per `placement`
    pub fn add(&mut self, format: &FormatSpec, landscape: bool, placement: Placement) -> &Mask {
        let (width, height) = format.size_with_orientation(Orientation::from_landscape(landscape));
        let id = self.allocate_id();
        let mask = Mask {
            id,
            rect: clamp_origin(placement.rect_for(width, height)),
            landscape,
            grid: None,
        };
        log::debug!("Added {}", mask);
        self.masks.push(mask);
        &self.masks[self.masks.len() - 1]
    }

    /// Replace every mask with freshly generated tiles.
    ///
    /// Ids continue from the last one handed out, so an id is never reused.
    pub fn set_all(&mut self, tiles: impl IntoIterator<Item = Tile>) {
        self.selected = None;
        self.masks.clear();
        for tile in tiles {
            let id = self.allocate_id();
            self.masks.push(Mask {
                id,
                rect: clamp_origin(tile.rect),
                landscape: tile.landscape,
                grid: tile.grid,
            });
        }
    }

    /// Remove a mask. Returns `false` if the id is unknown.
    pub fn remove(&mut self, id: MaskId) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        self.masks.remove(index);
        if self.selected == Some(id) {
            self.selected = None;
        }
        true
    }

    /// Remove the selected mask, if any
    pub fn remove_selected(&mut self) -> Option<MaskId> {
        let id = self.selected?;
        self.remove(id).then_some(id)
    }

    /// Rotate a mask by 90 degrees about its center.
    ///
    /// Width and height swap and the landscape flag toggles. The center is
    /// kept exactly, so two rotations restore the original rectangle even for
    /// masks whose rotated form reaches past the page origin.
    pub fn rotate(&mut self, id: MaskId) -> Option<&Mask> {
        let index = self.position(id)?;
        let mask = &mut self.masks[index];
        mask.rect = Rect::centered_on(mask.rect.center(), mask.rect.height, mask.rect.width);
        mask.landscape = !mask.landscape;
        Some(&self.masks[index])
    }

    /// Rotate the selected mask, if any
    pub fn rotate_selected(&mut self) -> Option<&Mask> {
        let id = self.selected?;
        self.rotate(id)
    }

    /// Move a mask by an offset in page space, stopping at the page origin
    pub fn move_by(&mut self, id: MaskId, dx: f64, dy: f64) -> Option<&Mask> {
        let index = self.position(id)?;
        let mask = &mut self.masks[index];
        mask.rect = clamp_origin(Rect::new(
            mask.rect.x + dx,
            mask.rect.y + dy,
            mask.rect.width,
            mask.rect.height,
        ));
        Some(&self.masks[index])
    }

    /// Select a mask, replacing any previous selection.
    ///
    /// Selecting an unknown id leaves the selection unchanged.
    pub fn select(&mut self, id: MaskId) -> bool {
        if self.position(id).is_some() {
            self.selected = Some(id);
            true
        } else {
            false
        }
    }

    pub fn deselect(&mut self) {
        self.selected = None;
    }

    /// Topmost mask (most recently created) containing a page-space point
    pub fn hit_test(&self, point: Point) -> Option<MaskId> {
        self.masks
            .iter()
            .rev()
            .find(|mask| mask.rect.contains(point))
            .map(|mask| mask.id)
    }

    /// Select the topmost mask under a page-space point; a miss clears the
    /// selection
    pub fn select_at(&mut self, point: Point) -> Option<MaskId> {
        self.selected = self.hit_test(point);
        self.selected
    }

    /// Remove every mask and the selection
    pub fn clear(&mut self) {
        self.masks.clear();
        self.selected = None;
    }

    pub fn masks(&self) -> &[Mask] {
        &self.masks
    }

    pub fn get(&self, id: MaskId) -> Option<&Mask> {
        self.masks.iter().find(|mask| mask.id == id)
    }

    pub fn selected_id(&self) -> Option<MaskId> {
        self.selected
    }

    pub fn selected(&self) -> Option<&Mask> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn len(&self) -> usize {
        self.masks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    /// Copy of the current mask list, in creation order
    pub fn snapshot(&self) -> Vec<Mask> {
        self.masks.clone()
    }
}

// =============================================================================
// Tests
// =============================================================================
