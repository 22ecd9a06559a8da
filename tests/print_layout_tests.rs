//! Tests for the printable order layout
//!
//! These tests verify that:
//! - Rows are packed into columns and pages with the configured capacity
//! - Category banners repeat at the top of continued columns
//! - Totals and the note appear once, on the last page only
//! - Rendering is deterministic and escapes user input

use chrono::{TimeZone, Utc};
use material_order::prelude::*;
use material_order::print::LayoutRow;

fn item(name: String, category: &str, quantity: u32, weight: f64) -> OrderLineItem {
    OrderLineItem {
        material_id: Uuid::new_v4(),
        name,
        category_name: category.to_string(),
        quantity,
        weight_per_unit: weight,
        total_weight: round4(weight * f64::from(quantity)),
    }
}

fn document(items: Vec<OrderLineItem>) -> OrderDocument {
    let total_weight = round4(items.iter().map(|i| i.total_weight).sum());
    OrderDocument {
        orderer_name: "山田太郎".to_string(),
        site_name: Some("新宿現場".to_string()),
        contact_info: None,
        loading_date: None,
        order_date: Utc.with_ymd_and_hms(2026, 10, 18, 3, 0, 0).unwrap(),
        note: Some("午前中搬入".to_string()),
        items,
        total_weight,
    }
}

/// 40 枠 + 30 くさび + 25 その他, one kilogram each
fn large_document() -> OrderDocument {
    let mut items = Vec::new();
    for (category, count) in [("枠", 40), ("くさび", 30), ("その他", 25)] {
        for i in 0..count {
            items.push(item(format!("{category} {i}"), category, 1, 1.0));
        }
    }
    document(items)
}

fn render(doc: &OrderDocument) -> String {
    render_printable(doc, &PrintOptions::default(), &LayoutSettings::default())
}

// =============================================================================
// Layout Plan Tests
// =============================================================================

mod plan_tests {
    use super::*;

    #[test]
    fn test_large_order_spans_two_pages() {
        let plan = plan_layout(&large_document(), &LayoutSettings::default());

        // 95 items + 3 banners = 98 rows
        assert_eq!(plan.column_count, 4);
        assert_eq!(plan.page_count(), 2);
        assert_eq!(plan.item_count, 95);
        assert!(plan.compact);

        assert!(!plan.pages[0].is_last);
        assert!(plan.pages[1].is_last);
        assert_eq!(plan.pages[0].columns.len(), 2);
        assert_eq!(plan.pages[1].columns.len(), 2);
    }

    #[test]
    fn test_banners_repeat_in_continued_columns() {
        let plan = plan_layout(&large_document(), &LayoutSettings::default());
        let columns: Vec<_> = plan.pages.iter().flat_map(|p| p.columns.iter()).collect();

        assert_eq!(columns[0].banners(), vec!["枠"]);
        assert_eq!(columns[1].banners(), vec!["枠", "くさび"]);
        assert_eq!(columns[2].banners(), vec!["くさび", "その他"]);
        assert_eq!(columns[3].banners(), vec!["その他"]);

        assert_eq!(columns[0].continued, None);
        assert_eq!(columns[1].continued.as_deref(), Some("枠"));
        assert_eq!(columns[3].item_count(), 8);
    }

    #[test]
    fn test_column_capacity_is_respected() {
        let plan = plan_layout(&large_document(), &LayoutSettings::default());
        for page in &plan.pages {
            for column in &page.columns {
                assert!(column.rows.len() <= 30);
            }
        }
    }

    #[test]
    fn test_small_order_is_split_into_two_columns() {
        let items = (0..5)
            .map(|i| item(format!("枠 {i}"), "枠", 2, 15.6))
            .collect();
        let plan = plan_layout(&document(items), &LayoutSettings::default());

        assert_eq!(plan.page_count(), 1);
        assert_eq!(plan.column_count, 2);
        let columns = &plan.pages[0].columns;
        assert_eq!(columns[0].rows.len(), 3);
        assert_eq!(columns[1].rows.len(), 3);
        assert!(matches!(columns[0].rows[0], LayoutRow::Header { .. }));
        assert!(!plan.compact);
    }

    #[test]
    fn test_empty_order_has_one_page() {
        let plan = plan_layout(&document(Vec::new()), &LayoutSettings::default());

        assert_eq!(plan.page_count(), 1);
        assert_eq!(plan.column_count, 0);
        assert!(plan.pages[0].is_last);
        assert!(plan.pages[0].columns.is_empty());
    }

    #[test]
    fn test_custom_capacity() {
        let settings = LayoutSettings {
            rows_per_column: 10,
            columns_per_page: 3,
            ..LayoutSettings::default()
        };
        let plan = plan_layout(&large_document(), &settings);

        // ceil(98 / 10) columns, ceil(10 / 3) pages
        assert_eq!(plan.column_count, 10);
        assert_eq!(plan.page_count(), 4);
        assert_eq!(plan.pages[3].columns.len(), 1);
    }
}

// =============================================================================
// Rendered Document Tests
// =============================================================================

mod render_tests {
    use super::*;

    #[test]
    fn test_multi_page_document_structure() {
        let html = render(&large_document());

        assert_eq!(html.matches("<div class=\"page\"").count(), 2);
        assert_eq!(html.matches("page-break-after: always").count(), 1);
        assert_eq!(html.matches("合計重量:").count(), 1);
        assert_eq!(html.matches("備考:").count(), 1);
        assert_eq!(html.matches("（続き）").count(), 3);
        assert!(html.contains("1/2"));
        assert!(html.contains("2/2"));
        assert!(html.contains("class=\"compact\""));
        assert!(html.contains("95kg"));
    }

    #[test]
    fn test_totals_follow_last_page() {
        let html = render(&large_document());

        let last_page = html.rfind("<div class=\"page\"").expect("page");
        let totals = html.find("合計重量:").expect("totals");
        assert!(totals > last_page);
    }

    #[test]
    fn test_single_page_has_no_page_indicator() {
        let items = vec![
            item("枠　1200".to_string(), "枠", 10, 15.6),
            item("パイプ　2.0m".to_string(), "その他", 3, 4.16),
        ];
        let html = render(&document(items));

        assert_eq!(html.matches("<div class=\"page\"").count(), 1);
        assert!(!html.contains("page-break-after"));
        assert!(!html.contains("class=\"page-indicator\""));
        assert!(html.contains("168.48kg"));
        assert!(html.contains("2026年10月18日"));
        assert!(!html.contains("class=\"compact\""));
    }

    #[test]
    fn test_empty_document_still_prints_totals() {
        let html = render(&document(Vec::new()));

        assert_eq!(html.matches("<div class=\"page\"").count(), 1);
        assert_eq!(html.matches("合計重量:").count(), 1);
        assert!(html.contains("0kg"));
        assert!(!html.contains("category-banner\""));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let doc = large_document();
        assert_eq!(render(&doc), render(&doc));
    }

    #[test]
    fn test_user_text_is_escaped() {
        let mut doc = document(vec![item(
            "<b>特注</b>".to_string(),
            "その他",
            1,
            2.5,
        )]);
        doc.orderer_name = "<script>alert(1)</script>".to_string();
        doc.note = Some("\"quoted\" & <i>note</i>".to_string());

        let html = render(&doc);

        assert!(!html.contains("<script>alert"));
        assert!(!html.contains("<b>特注"));
        assert!(!html.contains("<i>note"));
        assert!(html.contains("&lt;script&gt;alert(1)"));
        assert!(html.contains("&lt;b&gt;特注"));
        assert!(html.contains("&amp;"));
    }

    #[test]
    fn test_watermark_tiles() {
        let html = render(&document(Vec::new()));
        assert_eq!(
            html.matches(">発注書</span>").count(),
            material_order::print::WATERMARK_ROWS * material_order::print::WATERMARK_COLUMNS
        );
    }
}
