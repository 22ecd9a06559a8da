//! Standard scaffolding catalog
//!
//! Four categories in tab order. `その他` is the catch-all category and the
//! only one that accepts ad-hoc materials during order entry.

use crate::core::error::AppResult;
use crate::core::model::{Category, MaterialScope, NewMaterial};
use crate::core::store::Store;
use uuid::Uuid;

struct SeedMaterial {
    name: &'static str,
    size: Option<&'static str>,
    kind: &'static str,
    weight_kg: f64,
}

const fn item(
    name: &'static str,
    size: Option<&'static str>,
    kind: &'static str,
    weight_kg: f64,
) -> SeedMaterial {
    SeedMaterial {
        name,
        size,
        kind,
        weight_kg,
    }
}

const FRAME: &[SeedMaterial] = &[
    item("枠　1200", Some("1200"), "標準", 15.6),
    item("枠　1200　ロングピン", Some("1200"), "ロングピン", 16.0),
    item("枠　900", Some("900"), "標準", 14.6),
    item("枠　900　ロングピン", Some("900"), "ロングピン", 15.0),
    item("枠　600", Some("600"), "標準", 12.6),
    item("枠　600　ロングピン", Some("600"), "ロングピン", 13.0),
    item("階段", None, "標準", 20.0),
    item("階段　ロングピン", None, "ロングピン", 20.9),
    item("階段開口部", None, "開口部", 13.5),
    item("階段手摺", None, "手摺", 4.0),
    item("ジャッキベース", None, "標準", 3.7),
    item("ロングジャッキベース", None, "ロング", 5.0),
    item("筋違　L1829H1700", Some("1829x1700"), "筋違", 4.2),
    item("筋違　L1524H1700", Some("1524x1700"), "筋違", 3.7),
    item("筋違　L1219H1700", Some("1219x1700"), "筋違", 3.3),
    item("筋違　L914H1700", Some("914x1700"), "筋違", 2.9),
];

const WEDGE: &[SeedMaterial] = &[
    item("支柱　3600", Some("3600"), "支柱", 13.3),
    item("支柱　2700", Some("2700"), "支柱", 10.0),
    item("支柱　1800", Some("1800"), "支柱", 7.0),
    item("支柱　900", Some("900"), "支柱", 3.8),
    item("支柱　450", Some("450"), "支柱", 2.1),
    item("支柱　根がらみ", None, "支柱", 3.4),
    item("手摺（くさび）　1800", Some("1800"), "手摺くさび", 4.3),
    item("手摺（くさび）　1500", Some("1500"), "手摺くさび", 3.8),
    item("手摺（くさび）　1200", Some("1200"), "手摺くさび", 3.3),
    item("手摺（くさび）　900", Some("900"), "手摺くさび", 2.5),
    item("手摺（くさび）　600", Some("600"), "手摺くさび", 1.7),
    item("手摺（くさび）　300", Some("300"), "手摺くさび", 1.1),
];

const SHEET: &[SeedMaterial] = &[
    item("メッシュシート　Ⅰ類　1.8×5.1", Some("1.8×5.1"), "Ⅰ類メーター", 5.0),
    item("メッシュシート　Ⅰ類　1.5×5.1", Some("1.5×5.1"), "Ⅰ類メーター", 4.1),
    item("メッシュシート　Ⅰ類　1.2×5.1", Some("1.2×5.1"), "Ⅰ類メーター", 3.4),
    item("メッシュシート　Ⅰ類　0.9×5.1", Some("0.9×5.1"), "Ⅰ類メーター", 2.7),
    item("メッシュシート　Ⅰ類　0.6×5.1", Some("0.6×5.1"), "Ⅰ類メーター", 2.0),
    item("メッシュシート　Ⅰ類　1.829×5.1", Some("1.829×5.1"), "Ⅰ類インチー", 5.5),
    item("メッシュシート　Ⅰ類　1.524×5.1", Some("1.524×5.1"), "Ⅰ類インチー", 4.6),
    item("メッシュシート　Ⅰ類　1.219×5.1", Some("1.219×5.1"), "Ⅰ類インチー", 3.7),
];

const OTHER: &[SeedMaterial] = &[
    item("パイプ　6.0m", Some("6.0m"), "パイプ", 12.48),
    item("パイプ　5.0m", Some("5.0m"), "パイプ", 10.40),
    item("パイプ　4.5m", Some("4.5m"), "パイプ", 9.36),
    item("パイプ　4.0m", Some("4.0m"), "パイプ", 8.32),
    item("パイプ　3.5m", Some("3.5m"), "パイプ", 7.28),
    item("パイプ　3.0m", Some("3.0m"), "パイプ", 6.24),
    item("パイプ　2.5m", Some("2.5m"), "パイプ", 5.20),
    item("パイプ　2.0m", Some("2.0m"), "パイプ", 4.16),
    item("パイプ　1.5m", Some("1.5m"), "パイプ", 3.12),
    item("パイプ　1.0m", Some("1.0m"), "パイプ", 2.08),
    item("パイプ　0.5m", Some("0.5m"), "パイプ", 1.04),
    item("杭　1.0m", Some("1.0m"), "杭", 2.73),
    item("杭　1.5m", Some("1.5m"), "杭", 4.10),
    item("クランプ直交", None, "クランプ", 0.70),
    item("クランプ自在", None, "クランプ", 0.73),
    item("キャッチクランプ直交", None, "クランプ", 1.80),
];

/// `(name, code prefix, catch-all, materials)` in display order
const CATALOG: &[(&str, &str, bool, &[SeedMaterial])] = &[
    ("枠", "WK", false, FRAME),
    ("くさび", "KS", false, WEDGE),
    ("シート", "SH", false, SHEET),
    ("その他", "OT", true, OTHER),
];

/// Seed the standard categories and materials, returning the material count
pub async fn seed_catalog(store: &dyn Store) -> AppResult<usize> {
    let mut count = 0;

    for (index, (name, prefix, catch_all, materials)) in CATALOG.iter().enumerate() {
        let category = store
            .create_category(Category {
                id: Uuid::new_v4(),
                name: name.to_string(),
                display_order: index as i32 + 1,
                code_prefix: prefix.to_string(),
                catch_all: *catch_all,
            })
            .await?;

        for material in materials.iter() {
            store
                .create_material(NewMaterial {
                    name: material.name.to_string(),
                    category_id: category.id,
                    size: material.size.map(str::to_string),
                    kind: Some(material.kind.to_string()),
                    weight_kg: material.weight_kg,
                    scope: MaterialScope::Permanent,
                })
                .await?;
            count += 1;
        }
    }

    tracing::debug!(materials = count, "seeded catalog");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::MaterialFilter;
    use crate::storage::InMemoryStore;

    #[tokio::test]
    async fn test_seed_catalog() {
        let store = InMemoryStore::new();
        let count = seed_catalog(&store).await.unwrap();

        let categories = store.list_categories().await.unwrap();
        let names: Vec<_> = categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["枠", "くさび", "シート", "その他"]);
        assert_eq!(categories.iter().filter(|c| c.catch_all).count(), 1);

        let materials = store.list_materials(&MaterialFilter::active()).await.unwrap();
        assert_eq!(materials.len(), count);
        assert_eq!(materials[0].code, "WK-001");

        let pipe = materials.iter().find(|m| m.name == "パイプ　2.0m").unwrap();
        assert_eq!(pipe.code, "OT-008");
        assert_eq!(pipe.weight_kg, 4.16);
    }
}
