//! Rendering a layout plan into a self-contained printable document

use super::layout::{LayoutPlan, LayoutRow, LayoutSettings, PlannedColumn, plan_layout};
use super::style::{DensityTokens, WATERMARK_TEXT, WatermarkTile, density, watermark_tiles};
use crate::core::model::OrderDocument;
use crate::core::weight::{format_weight, format_weight_full};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tera::{Context, Tera, escape_html};

const TEMPLATE_NAME: &str = "order.html";
const TEMPLATE: &str = include_str!("templates/order.html");

/// Errors raised while rendering through the template engine
#[derive(Debug, thiserror::Error)]
pub enum PrintError {
    #[error("template error: {0}")]
    Template(#[from] tera::Error),
}

/// Caller options for a printable document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintOptions {
    /// Omit the on-screen print button
    #[serde(default)]
    pub hide_print_button: bool,
}

/// `YYYY年M月D日`
pub fn format_japanese_date(date: NaiveDate) -> String {
    format!("{}年{}月{}日", date.year(), date.month(), date.day())
}

/// Calendar date of an instant at a fixed UTC offset
pub fn local_date(at: DateTime<Utc>, utc_offset_hours: i32) -> NaiveDate {
    match FixedOffset::east_opt(utc_offset_hours * 3600) {
        Some(offset) => at.with_timezone(&offset).date_naive(),
        None => at.date_naive(),
    }
}

#[derive(Debug, Serialize)]
struct InfoField {
    label: &'static str,
    value: String,
}

/// Header fields in fixed order; optional ones only when present
fn info_fields(doc: &OrderDocument, settings: &LayoutSettings) -> Vec<InfoField> {
    let mut fields = vec![
        InfoField {
            label: "発注日",
            value: format_japanese_date(local_date(doc.order_date, settings.utc_offset_hours)),
        },
        InfoField {
            label: "発注者",
            value: doc.orderer_name.clone(),
        },
    ];
    if let Some(site) = doc.site_name.as_deref().filter(|s| !s.is_empty()) {
        fields.push(InfoField {
            label: "現場名",
            value: site.to_string(),
        });
    }
    if let Some(contact) = doc.contact_info.as_deref().filter(|s| !s.is_empty()) {
        fields.push(InfoField {
            label: "連絡先",
            value: contact.to_string(),
        });
    }
    if let Some(date) = doc.loading_date {
        fields.push(InfoField {
            label: "積込日",
            value: format_japanese_date(date),
        });
    }
    fields
}

#[derive(Debug, Serialize)]
struct RowView {
    banner: bool,
    continued: bool,
    category: String,
    name: String,
    quantity: u32,
    unit_weight: String,
    line_weight: String,
    striped: bool,
}

impl RowView {
    fn banner(category: &str, continued: bool) -> Self {
        Self {
            banner: true,
            continued,
            category: category.to_string(),
            name: String::new(),
            quantity: 0,
            unit_weight: String::new(),
            line_weight: String::new(),
            striped: false,
        }
    }
}

#[derive(Debug, Serialize)]
struct ColumnView {
    rows: Vec<RowView>,
}

/// Expand a planned column into rendered rows
///
/// Striping restarts at every banner and at the top of the column.
fn column_view(column: &PlannedColumn) -> ColumnView {
    let mut rows = Vec::with_capacity(column.rows.len() + 1);
    if let Some(category) = &column.continued {
        rows.push(RowView::banner(category, true));
    }

    let mut index_in_group = 0usize;
    for row in &column.rows {
        match row {
            LayoutRow::Header { category } => {
                rows.push(RowView::banner(category, false));
                index_in_group = 0;
            }
            LayoutRow::Item(item) => {
                rows.push(RowView {
                    banner: false,
                    continued: false,
                    category: item.category_name.clone(),
                    name: item.name.clone(),
                    quantity: item.quantity,
                    unit_weight: format_weight(item.weight_per_unit),
                    line_weight: format_weight(item.total_weight),
                    striped: index_in_group % 2 == 1,
                });
                index_in_group += 1;
            }
        }
    }
    ColumnView { rows }
}

#[derive(Debug, Serialize)]
struct PageView {
    number: usize,
    is_last: bool,
    columns: Vec<ColumnView>,
}

#[derive(Debug, Serialize)]
struct DocumentView<'a> {
    title: &'a str,
    orderer_name: &'a str,
    compact: bool,
    density: DensityTokens,
    show_print_button: bool,
    page_count: usize,
    pages: Vec<PageView>,
    info: Vec<InfoField>,
    total_weight: String,
    note: Option<&'a str>,
    watermark: Vec<WatermarkTile>,
    watermark_text: &'static str,
}

fn document_view<'a>(
    doc: &'a OrderDocument,
    plan: &LayoutPlan,
    options: &PrintOptions,
    settings: &'a LayoutSettings,
) -> DocumentView<'a> {
    let pages = plan
        .pages
        .iter()
        .map(|page| PageView {
            number: page.number,
            is_last: page.is_last,
            columns: page.columns.iter().map(column_view).collect(),
        })
        .collect();

    DocumentView {
        title: &settings.title,
        orderer_name: &doc.orderer_name,
        compact: plan.compact,
        density: density(plan.compact),
        show_print_button: !options.hide_print_button,
        page_count: plan.page_count(),
        pages,
        info: info_fields(doc, settings),
        total_weight: format_weight_full(doc.total_weight),
        note: doc.note.as_deref().filter(|n| !n.trim().is_empty()),
        watermark: watermark_tiles(),
        watermark_text: WATERMARK_TEXT,
    }
}

fn render_with_tera(view: &DocumentView<'_>) -> Result<String, PrintError> {
    let mut tera = Tera::default();
    tera.add_raw_template(TEMPLATE_NAME, TEMPLATE)?;
    let context = Context::from_serialize(view)?;
    Ok(tera.render(TEMPLATE_NAME, &context)?)
}

/// Minimal document without tables, used if the template cannot render
fn fallback_document(view: &DocumentView<'_>) -> String {
    let mut html = String::from("<!DOCTYPE html>\n<html lang=\"ja\">\n<head>\n<meta charset=\"UTF-8\">\n");
    html.push_str("<style>@page { size: A4 portrait; }</style>\n</head>\n<body>\n");
    html.push_str(&format!("<h1>{}</h1>\n", escape_html(view.title)));
    for field in &view.info {
        html.push_str(&format!(
            "<div class=\"info-row\">{}: {}</div>\n",
            field.label,
            escape_html(&field.value)
        ));
    }
    html.push_str(&format!(
        "<div class=\"total-section\">合計重量: {}</div>\n",
        escape_html(&view.total_weight)
    ));
    if let Some(note) = view.note {
        html.push_str(&format!("<div class=\"note-section\">備考: {}</div>\n", escape_html(note)));
    }
    html.push_str("</body>\n</html>\n");
    html
}

/// Render an order document as a printable HTML page
///
/// Pure: identical inputs yield byte-identical output. Every user-supplied
/// string is HTML-escaped. The totals and note appear only on the last page.
pub fn render_printable(
    doc: &OrderDocument,
    options: &PrintOptions,
    settings: &LayoutSettings,
) -> String {
    let plan = plan_layout(doc, settings);
    let view = document_view(doc, &plan, options, settings);

    match render_with_tera(&view) {
        Ok(html) => html,
        Err(e) => {
            tracing::error!(error = %e, "print template failed, using fallback document");
            fallback_document(&view)
        }
    }
}
