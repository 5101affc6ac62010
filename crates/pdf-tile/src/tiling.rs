//! Overlapping tile grid generation
//!
//! Tiles are laid out row-major from the page's top-left corner. Each step is
//! the tile edge minus the overlap, and one extra row and column beyond a tight
//! cover are considered so the far edge is always reached. Tiles that would
//! start past the page are dropped; tiles crossing the right or bottom edge are
//! shortened to end at the page edge.

use crate::constants::MAX_TILES;
use crate::options::TilingConfig;
use crate::types::*;

/// A generated tile, before it receives an id in a
/// [`MaskModel`](crate::MaskModel)
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    /// Emitted rectangle, shortened at the right and bottom page edges
    pub rect: Rect,
    pub landscape: bool,
    pub grid: Option<GridPosition>,
}

/// Step between tile origins and grid dimensions for one generation request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPlan {
    pub tile_width: f64,
    pub tile_height: f64,
    pub step_x: f64,
    pub step_y: f64,
    pub cols: usize,
    pub rows: usize,
}

impl GridPlan {
    /// Nominal (unclamped) rectangle of the tile at a grid position
    pub fn nominal_rect(&self, pos: GridPosition) -> Rect {
        Rect::new(
            pos.col as f64 * self.step_x,
            pos.row as f64 * self.step_y,
            self.tile_width,
            self.tile_height,
        )
    }
}

/// Tiles needed along one axis: one past a tight cover of the remainder.
///
/// `None` when the count is not finite or exceeds [`MAX_TILES`].
fn tiles_along(page_extent: f64, tile_extent: f64, step: f64) -> Option<usize> {
    let count = ((page_extent - tile_extent) / step).floor() + 2.0;
    if !count.is_finite() || count > MAX_TILES as f64 {
        return None;
    }
    Some(if count >= 1.0 { count as usize } else { 1 })
}

/// Compute tile size, step and grid dimensions without emitting tiles
pub fn plan_grid(page: PageGeometry, config: &TilingConfig) -> Result<GridPlan> {
    config.validate()?;

    let (tile_width, tile_height) = config.tile_size_pt();
    let overlap = config.overlap_percent / 100.0;
    let step_x = tile_width * (1.0 - overlap);
    let step_y = tile_height * (1.0 - overlap);

    if !(step_x > 0.0 && step_y > 0.0 && step_x.is_finite() && step_y.is_finite()) {
        return Err(TileError::Config(format!(
            "Tile step must be positive (overlap {}%)",
            config.overlap_percent
        )));
    }

    let too_many = || {
        TileError::Config(format!(
            "Grid for a {:.1} x {:.1} pt page with {}% overlap exceeds {} tiles",
            page.width_pt, page.height_pt, config.overlap_percent, MAX_TILES
        ))
    };
    let cols = tiles_along(page.width_pt, tile_width, step_x).ok_or_else(too_many)?;
    let rows = tiles_along(page.height_pt, tile_height, step_y).ok_or_else(too_many)?;
    match cols.checked_mul(rows) {
        Some(total) if total <= MAX_TILES => {}
        _ => return Err(too_many()),
    }

    Ok(GridPlan {
        tile_width,
        tile_height,
        step_x,
        step_y,
        cols,
        rows,
    })
}

/// Grid dimensions (cols, rows) considered for a page
pub fn grid_dimensions(page: PageGeometry, config: &TilingConfig) -> Result<(usize, usize)> {
    let plan = plan_grid(page, config)?;
    Ok((plan.cols, plan.rows))
}

/// Generate the full tile grid for a page, in row-major order.
///
/// Fails with [`TileError::Config`] when the overlap leaves no forward step
/// or the grid would exceed [`MAX_TILES`].
pub fn generate_masks(page: PageGeometry, config: &TilingConfig) -> Result<Vec<Tile>> {
    let plan = plan_grid(page, config)?;
    let mut tiles = Vec::with_capacity(plan.cols * plan.rows);

    for row in 0..plan.rows {
        for col in 0..plan.cols {
            let pos = GridPosition::new(row, col);
            let nominal = plan.nominal_rect(pos);

            if nominal.x >= page.width_pt || nominal.y >= page.height_pt {
                continue;
            }

            tiles.push(Tile {
                rect: Rect::new(
                    nominal.x,
                    nominal.y,
                    nominal.width.min(page.width_pt - nominal.x),
                    nominal.height.min(page.height_pt - nominal.y),
                ),
                landscape: config.landscape,
                grid: Some(pos),
            });
        }
    }

    log::debug!(
        "Generated {} tiles ({}x{} grid, step {:.1} x {:.1} pt)",
        tiles.len(),
        plan.cols,
        plan.rows,
        plan.step_x,
        plan.step_y
    );

    Ok(tiles)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn a4_portrait(overlap: f64) -> TilingConfig {
        TilingConfig::new(overlap, "A4", false)
    }

    #[test]
    fn test_page_smaller_than_tile() {
        let page = PageGeometry::new(300.0, 400.0);
        let tiles = generate_masks(page, &a4_portrait(15.0)).unwrap();

        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].rect, Rect::new(0.0, 0.0, 300.0, 400.0));
        assert_eq!(tiles[0].grid, Some(GridPosition::new(0, 0)));
    }

    #[test]
    fn test_exact_fit_without_overlap() {
        let (w, h) = crate::formats::format_size("A4");
        let page = PageGeometry::new(w * 2.0, h);
        let plan = plan_grid(page, &a4_portrait(0.0)).unwrap();

        // One more than the tight cover in each direction
        assert_eq!((plan.cols, plan.rows), (3, 2));

        let tiles = generate_masks(page, &a4_portrait(0.0)).unwrap();
        // The extra column and row start exactly at the far edges and are dropped
        assert_eq!(tiles.len(), 2);
    }

    #[test]
    fn test_edge_tiles_are_shortened() {
        let page = PageGeometry::new(1000.0, 900.0);
        let tiles = generate_masks(page, &a4_portrait(10.0)).unwrap();

        for tile in &tiles {
            assert!(tile.rect.right() <= page.width_pt + 1e-9);
            assert!(tile.rect.bottom() <= page.height_pt + 1e-9);
            assert!(tile.rect.width > 0.0 && tile.rect.height > 0.0);
        }
    }

    #[test]
    fn test_landscape_swaps_tile_edges() {
        let plan = plan_grid(
            PageGeometry::new(5000.0, 5000.0),
            &TilingConfig::new(0.0, "A3", true),
        )
        .unwrap();
        let (w, h) = crate::formats::format_size("A3");
        assert_eq!(plan.tile_width, h);
        assert_eq!(plan.tile_height, w);
    }

    #[test]
    fn test_full_overlap_rejected() {
        let page = PageGeometry::new(1000.0, 1000.0);
        for overlap in [100.0, 150.0, -5.0, f64::NAN] {
            match generate_masks(page, &a4_portrait(overlap)) {
                Err(TileError::Config(_)) => {}
                other => panic!("expected config error for {overlap}, got {other:?}"),
            }
        }
    }
}
