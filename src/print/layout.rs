//! Layout planning: grouping, row construction, column and page packing
//!
//! Every function here is pure. The plan fixes how many columns and pages a
//! document occupies; presentation (continuation banners, striping, compact
//! density, watermark) never changes these counts.

use crate::core::model::{OrderDocument, OrderLineItem};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Tunable layout constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    /// Rows per printed column (N)
    pub rows_per_column: usize,
    /// Columns per printed page (M)
    pub columns_per_page: usize,
    /// Item count at which compact density kicks in
    pub compact_threshold: usize,
    /// Offset applied to the order date when printing it
    pub utc_offset_hours: i32,
    /// Document title in the page header
    pub title: String,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            rows_per_column: 30,
            columns_per_page: 2,
            compact_threshold: 90,
            utc_offset_hours: 9,
            title: "資材発注書".to_string(),
        }
    }
}

/// Items of one category, in the order they were given
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryGroup {
    pub name: String,
    pub items: Vec<OrderLineItem>,
}

/// One row of the flat print sequence
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutRow {
    /// Full-width category banner
    Header { category: String },
    /// A data row
    Item(OrderLineItem),
}

impl LayoutRow {
    pub fn category(&self) -> &str {
        match self {
            LayoutRow::Header { category } => category,
            LayoutRow::Item(item) => &item.category_name,
        }
    }

    pub fn is_header(&self) -> bool {
        matches!(self, LayoutRow::Header { .. })
    }
}

/// Partition items by category name, preserving first-seen category order
pub fn group_by_category(items: &[OrderLineItem]) -> Vec<CategoryGroup> {
    let mut groups: IndexMap<&str, Vec<OrderLineItem>> = IndexMap::new();
    for item in items {
        groups
            .entry(item.category_name.as_str())
            .or_default()
            .push(item.clone());
    }
    groups
        .into_iter()
        .map(|(name, items)| CategoryGroup {
            name: name.to_string(),
            items,
        })
        .collect()
}

/// Flatten groups into rows, each group preceded by its header row
pub fn build_rows(groups: &[CategoryGroup]) -> Vec<LayoutRow> {
    let mut rows = Vec::with_capacity(groups.iter().map(|g| g.items.len() + 1).sum());
    for group in groups {
        rows.push(LayoutRow::Header {
            category: group.name.clone(),
        });
        rows.extend(group.items.iter().cloned().map(LayoutRow::Item));
    }
    rows
}

/// Split rows into columns of `rows_per_column` rows
///
/// The last column may be shorter. When there is at least one row and only
/// one column results, it is split at `ceil(L / 2)` so that every non-empty
/// document prints at least two columns.
pub fn pack_columns(rows: &[LayoutRow], rows_per_column: usize) -> Vec<Vec<LayoutRow>> {
    if rows.is_empty() {
        return Vec::new();
    }

    let columns: Vec<Vec<LayoutRow>> = rows
        .chunks(rows_per_column.max(1))
        .map(<[LayoutRow]>::to_vec)
        .collect();

    if columns.len() == 1 {
        let mid = rows.len().div_ceil(2);
        return vec![rows[..mid].to_vec(), rows[mid..].to_vec()];
    }
    columns
}

/// Group columns into pages of at most `columns_per_page` columns
pub fn pack_pages<T: Clone>(columns: &[T], columns_per_page: usize) -> Vec<Vec<T>> {
    columns
        .chunks(columns_per_page.max(1))
        .map(<[T]>::to_vec)
        .collect()
}

/// A packed column with its continuation banner
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedColumn {
    /// Category carried over from the previous column, if the column starts
    /// in the middle of a group
    pub continued: Option<String>,
    pub rows: Vec<LayoutRow>,
}

impl PlannedColumn {
    fn new(rows: Vec<LayoutRow>) -> Self {
        let continued = match rows.first() {
            Some(LayoutRow::Item(item)) => Some(item.category_name.clone()),
            _ => None,
        };
        Self { continued, rows }
    }

    /// Number of data rows in this column
    pub fn item_count(&self) -> usize {
        self.rows.iter().filter(|r| !r.is_header()).count()
    }

    /// Category banners shown in this column, continuation first
    pub fn banners(&self) -> Vec<&str> {
        self.continued
            .as_deref()
            .into_iter()
            .chain(self.rows.iter().filter(|r| r.is_header()).map(|r| r.category()))
            .collect()
    }
}

/// One physical page
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedPage {
    /// 1-based page number
    pub number: usize,
    pub columns: Vec<PlannedColumn>,
    pub is_last: bool,
}

/// The full pagination of a document
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutPlan {
    pub pages: Vec<PlannedPage>,
    pub column_count: usize,
    pub item_count: usize,
    pub compact: bool,
}

impl LayoutPlan {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Compose grouping, row construction and packing for a document
///
/// A document always occupies at least one page, so an order with no items
/// still prints its header, info and totals.
pub fn plan_layout(doc: &OrderDocument, settings: &LayoutSettings) -> LayoutPlan {
    let groups = group_by_category(&doc.items);
    let rows = build_rows(&groups);
    let columns: Vec<PlannedColumn> = pack_columns(&rows, settings.rows_per_column)
        .into_iter()
        .map(PlannedColumn::new)
        .collect();
    let column_count = columns.len();

    let mut packed = pack_pages(&columns, settings.columns_per_page);
    if packed.is_empty() {
        packed.push(Vec::new());
    }

    let page_count = packed.len();
    let pages = packed
        .into_iter()
        .enumerate()
        .map(|(index, columns)| PlannedPage {
            number: index + 1,
            columns,
            is_last: index + 1 == page_count,
        })
        .collect();

    LayoutPlan {
        pages,
        column_count,
        item_count: doc.items.len(),
        compact: doc.items.len() >= settings.compact_threshold,
    }
}
