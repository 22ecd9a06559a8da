//! Order aggregation: selection + catalog snapshot → line items and total

use crate::core::model::{Category, Material, OrderLineItem};
use crate::core::weight::round4;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Requested quantities keyed by material id
///
/// Only entries with a quantity above zero are part of the order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    quantities: HashMap<Uuid, u32>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a selection from request lines, summing repeated ids
    pub fn from_lines<I>(lines: I) -> Self
    where
        I: IntoIterator<Item = (Uuid, u32)>,
    {
        let mut selection = Self::new();
        for (material_id, quantity) in lines {
            let current = selection.get(&material_id);
            selection.set(material_id, current.saturating_add(quantity));
        }
        selection
    }

    /// Quantity for a material, zero when absent
    pub fn get(&self, material_id: &Uuid) -> u32 {
        self.quantities.get(material_id).copied().unwrap_or(0)
    }

    /// Set a quantity; zero removes the entry
    pub fn set(&mut self, material_id: Uuid, quantity: u32) {
        if quantity == 0 {
            self.quantities.remove(&material_id);
        } else {
            self.quantities.insert(material_id, quantity);
        }
    }

    pub fn clear(&mut self) {
        self.quantities.clear();
    }

    /// Number of materials with a positive quantity
    pub fn len(&self) -> usize {
        self.quantities.values().filter(|q| **q > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over selected `(material_id, quantity)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&Uuid, &u32)> {
        self.quantities.iter().filter(|(_, q)| **q > 0)
    }
}

/// Result of [`aggregate`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub items: Vec<OrderLineItem>,
    pub total_weight: f64,
}

/// Caller-owned catalog snapshot passed into the aggregator and the form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub categories: Vec<Category>,
    pub materials: Vec<Material>,
}

impl CatalogSnapshot {
    pub fn new(categories: Vec<Category>, materials: Vec<Material>) -> Self {
        Self {
            categories,
            materials,
        }
    }

    pub fn category(&self, id: &Uuid) -> Option<&Category> {
        self.categories.iter().find(|c| &c.id == id)
    }

    pub fn material(&self, id: &Uuid) -> Option<&Material> {
        self.materials.iter().find(|m| &m.id == id)
    }

    /// Category display name for a material, empty when unknown
    pub fn category_name_of(&self, material: &Material) -> String {
        self.category(&material.category_id)
            .map(|c| c.name.clone())
            .unwrap_or_default()
    }

    /// Aggregate a selection against this snapshot
    pub fn aggregate(&self, selection: &Selection) -> Aggregate {
        aggregate_with(selection, &self.materials, |m| self.category_name_of(m))
    }
}

/// Aggregate a selection against a catalog without category names
///
/// Items follow catalog iteration order. Unknown ids and zero quantities are
/// skipped. Every line total and the grand total pass through [`round4`].
pub fn aggregate(selection: &Selection, catalog: &[Material]) -> Aggregate {
    aggregate_with(selection, catalog, |_| String::new())
}

/// Aggregate with a caller-supplied category name lookup
pub fn aggregate_with<F>(selection: &Selection, catalog: &[Material], category_name: F) -> Aggregate
where
    F: Fn(&Material) -> String,
{
    if selection.is_empty() || catalog.is_empty() {
        return Aggregate::default();
    }

    let mut seen = HashSet::new();
    let mut items = Vec::new();
    let mut total = 0.0;

    for material in catalog {
        if !seen.insert(material.id) {
            continue;
        }

        let quantity = selection.get(&material.id);
        if quantity == 0 {
            continue;
        }

        let line_total = round4(material.weight_kg * f64::from(quantity));
        items.push(OrderLineItem {
            material_id: material.id,
            name: material.name.clone(),
            category_name: category_name(material),
            quantity,
            weight_per_unit: material.weight_kg,
            total_weight: line_total,
        });
        total += line_total;
    }

    Aggregate {
        items,
        total_weight: round4(total),
    }
}
