//! Domain records: catalog, order documents and persisted orders

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifetime of a catalog material
///
/// Draft-scoped materials are created ad hoc during order entry and exist only
/// for the lifetime of the order they were created for. They are invisible to
/// every other order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MaterialScope {
    Permanent,
    DraftScoped { order_id: Uuid },
}

impl MaterialScope {
    /// Order that owns this material, if it is draft-scoped
    pub fn draft_order(&self) -> Option<Uuid> {
        match self {
            MaterialScope::Permanent => None,
            MaterialScope::DraftScoped { order_id } => Some(*order_id),
        }
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self, MaterialScope::DraftScoped { .. })
    }
}

/// A catalog entry with a unit weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: Uuid,
    /// Prefixed sequential code, e.g. `WK-001`
    pub code: String,
    pub name: String,
    pub category_id: Uuid,
    pub size: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub weight_kg: f64,
    pub active: bool,
    pub scope: MaterialScope,
    pub created_at: DateTime<Utc>,
}

impl Material {
    /// Inactive entry standing in for an order line whose material is gone
    ///
    /// It carries the line's snapshot weight and resolves its category by name.
    pub fn stand_in(item: &OrderLineItem, categories: &[Category], created_at: DateTime<Utc>) -> Self {
        Material {
            id: item.material_id,
            code: String::new(),
            name: item.name.clone(),
            category_id: categories
                .iter()
                .find(|c| c.name == item.category_name)
                .map(|c| c.id)
                .unwrap_or_else(Uuid::nil),
            size: None,
            kind: None,
            weight_kg: item.weight_per_unit,
            active: false,
            scope: MaterialScope::Permanent,
            created_at,
        }
    }

    /// Whether this material may be offered while editing `draft`
    ///
    /// Inactive materials are never offered. Draft-scoped materials are only
    /// offered to the order that owns them.
    pub fn is_visible_for(&self, draft: Option<Uuid>) -> bool {
        if !self.active {
            return false;
        }
        match self.scope {
            MaterialScope::Permanent => true,
            MaterialScope::DraftScoped { order_id } => draft == Some(order_id),
        }
    }

    /// Case-insensitive substring match across name, size, type and code
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }

        [
            Some(self.name.as_str()),
            self.size.as_deref(),
            self.kind.as_deref(),
            Some(self.code.as_str()),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Data needed to create a material; the store assigns id and code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMaterial {
    pub name: String,
    pub category_id: Uuid,
    pub size: Option<String>,
    pub kind: Option<String>,
    pub weight_kg: f64,
    pub scope: MaterialScope,
}

impl NewMaterial {
    /// Duplicate an existing material under a new scope
    pub fn duplicate_of(material: &Material, scope: MaterialScope) -> Self {
        Self {
            name: material.name.clone(),
            category_id: material.category_id,
            size: material.size.clone(),
            kind: material.kind.clone(),
            weight_kg: material.weight_kg,
            scope,
        }
    }
}

/// A named grouping of materials with a fixed display order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub display_order: i32,
    /// Prefix of generated material codes
    pub code_prefix: String,
    /// The catch-all category is the only one that accepts ad-hoc materials
    pub catch_all: bool,
}

/// One aggregated line of an order with weight snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub material_id: Uuid,
    pub name: String,
    pub category_name: String,
    pub quantity: u32,
    /// Unit weight captured when the line was aggregated
    pub weight_per_unit: f64,
    /// `round4(weight_per_unit * quantity)`
    pub total_weight: f64,
}

/// The order document consumed by the print layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDocument {
    pub orderer_name: String,
    pub site_name: Option<String>,
    pub contact_info: Option<String>,
    pub loading_date: Option<NaiveDate>,
    pub order_date: DateTime<Utc>,
    pub note: Option<String>,
    pub items: Vec<OrderLineItem>,
    pub total_weight: f64,
}

impl OrderDocument {
    /// Sum the line totals the way the aggregator does
    pub fn recomputed_total(&self) -> f64 {
        let sum: f64 = self
            .items
            .iter()
            .map(|item| crate::core::weight::round4(item.total_weight))
            .sum();
        crate::core::weight::round4(sum)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Completed,
}

/// A persisted order, exclusively owned by the user who created it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub owner_id: Uuid,
    pub status: OrderStatus,
    pub document: OrderDocument,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_owned_by(&self, user_id: &Uuid) -> bool {
        &self.owner_id == user_id
    }

    /// Case-insensitive match on order number, site name and orderer
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [
            Some(self.order_number.as_str()),
            self.document.site_name.as_deref(),
            Some(self.document.orderer_name.as_str()),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Data handed to the store when persisting an order
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    /// Pre-allocated id, used when draft-scoped materials already point at it
    pub id: Option<Uuid>,
    pub status: OrderStatus,
    pub document: OrderDocument,
}

/// Authenticated user identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
}
