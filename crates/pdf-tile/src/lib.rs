pub mod constants;
pub mod coords;
pub mod export;
pub mod formats;
mod masks;
mod options;
pub mod render;
mod tiling;
mod types;

pub use export::{
    CancelToken, ExportReport, ExportedTile, FailedTile, SourceDocument, export_tiles,
    export_tiles_with, load_pdf, save_pdf, tile_file_name,
};
pub use formats::{FormatSpec, detect_format, format_size};
pub use masks::{Mask, MaskId, MaskModel, Placement};
pub use options::*;
pub use tiling::{GridPlan, Tile, generate_masks, grid_dimensions, plan_grid};
pub use types::*;
