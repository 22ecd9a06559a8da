//! Printable order documents
//!
//! Turns an [`OrderDocument`](crate::core::model::OrderDocument) into a
//! fixed-size, multi-column, multi-page HTML document for a browser print
//! engine.
//!
//! Items are grouped by category in first-seen order, flattened into rows
//! with a banner per group, packed into columns of `rows_per_column` rows and
//! pages of `columns_per_page` columns. A lone column is split in half so the
//! page stays balanced. Only the last page carries the totals and the note.

pub mod layout;
pub mod render;
pub mod style;

pub use layout::{
    CategoryGroup, LayoutPlan, LayoutRow, LayoutSettings, PlannedColumn, PlannedPage, build_rows,
    group_by_category, pack_columns, pack_pages, plan_layout,
};
pub use render::{PrintError, PrintOptions, format_japanese_date, render_printable};
pub use style::{WATERMARK_COLUMNS, WATERMARK_ROWS};
