//! Watermark tiling and density tokens
//!
//! The watermark grid is a function of fixed constants only, never of the
//! viewport, so rendering stays byte-for-byte reproducible.

use serde::Serialize;

/// Rows of watermark tiles per page
pub const WATERMARK_ROWS: usize = 6;
/// Columns of watermark tiles per page
pub const WATERMARK_COLUMNS: usize = 4;
/// Text repeated in every tile
pub const WATERMARK_TEXT: &str = "発注書";

/// A positioned watermark tile, offsets in viewport units
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatermarkTile {
    /// Offset from the top in `vh`
    pub top: String,
    /// Offset from the left in `vw`
    pub left: String,
}

/// The fixed tile grid; odd rows are shifted by half a column
pub fn watermark_tiles() -> Vec<WatermarkTile> {
    let row_step = 100.0 / WATERMARK_ROWS as f64;
    let column_step = 100.0 / WATERMARK_COLUMNS as f64;

    (0..WATERMARK_ROWS)
        .flat_map(|row| {
            let shift = if row % 2 == 1 { column_step / 2.0 } else { 0.0 };
            (0..WATERMARK_COLUMNS).map(move |column| WatermarkTile {
                top: format!("{:.2}", row as f64 * row_step),
                left: format!("{:.2}", column as f64 * column_step + shift),
            })
        })
        .collect()
}

/// Font size and cell padding for table cells
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DensityTokens {
    pub font_size: &'static str,
    pub cell_padding: &'static str,
    pub banner_font_size: &'static str,
}

pub const REGULAR_DENSITY: DensityTokens = DensityTokens {
    font_size: "11px",
    cell_padding: "3px 6px",
    banner_font_size: "12px",
};

pub const COMPACT_DENSITY: DensityTokens = DensityTokens {
    font_size: "9px",
    cell_padding: "1px 4px",
    banner_font_size: "10px",
};

pub fn density(compact: bool) -> DensityTokens {
    if compact { COMPACT_DENSITY } else { REGULAR_DENSITY }
}
