//! In-memory implementation of Store for testing and development

use crate::core::error::{AppError, AppResult, EntityError, StorageError};
use crate::core::model::{
    Category, Material, NewMaterial, NewOrder, Order, OrderDocument, OrderStatus, UserIdentity,
};
use crate::core::store::{MaterialFilter, Store};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

fn lock_error(e: impl std::fmt::Display) -> AppError {
    AppError::Storage(StorageError::LockPoisoned {
        message: e.to_string(),
    })
}

/// Next `<prefix>-NNN` code: highest existing number for the prefix plus one
pub fn next_material_code<'a>(prefix: &str, existing: impl Iterator<Item = &'a str>) -> String {
    let lead = format!("{}-", prefix);
    let highest = existing
        .filter_map(|code| code.strip_prefix(&lead))
        .filter_map(|number| number.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("{}-{:03}", prefix, highest + 1)
}

/// Sort key for a material code: prefix, then the numeric suffix
///
/// `WK-1000` sorts after `WK-999`; codes without a number sort last.
fn code_sort_key(code: &str) -> (&str, u32, &str) {
    match code.rsplit_once('-') {
        Some((prefix, number)) => (prefix, number.parse().unwrap_or(u32::MAX), number),
        None => (code, u32::MAX, ""),
    }
}

/// Human-readable order number `<USERNAME>-<YYYYMMDD>-<6 hex>`
pub fn generate_order_number(username: &str, at: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}",
        username,
        at.format("%Y%m%d"),
        &suffix[..6]
    )
    .to_uppercase()
}

/// In-memory store implementation
///
/// Useful for testing and development. Uses RwLock for thread-safe access.
#[derive(Clone)]
pub struct InMemoryStore {
    categories: Arc<RwLock<HashMap<Uuid, Category>>>,
    materials: Arc<RwLock<HashMap<Uuid, Material>>>,
    orders: Arc<RwLock<HashMap<Uuid, Order>>>,
}

impl InMemoryStore {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        Self {
            categories: Arc::new(RwLock::new(HashMap::new())),
            materials: Arc::new(RwLock::new(HashMap::new())),
            orders: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Toggle the active flag of a material
    pub fn set_material_active(&self, id: &Uuid, active: bool) -> AppResult<Material> {
        let mut materials = self.materials.write().map_err(lock_error)?;
        let material = materials
            .get_mut(id)
            .ok_or_else(|| AppError::not_found("material", *id))?;
        material.active = active;
        Ok(material.clone())
    }

    fn display_orders(&self) -> AppResult<HashMap<Uuid, i32>> {
        let categories = self.categories.read().map_err(lock_error)?;
        Ok(categories
            .values()
            .map(|c| (c.id, c.display_order))
            .collect())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let categories = self.categories.read().map_err(lock_error)?;
        let mut list: Vec<Category> = categories.values().cloned().collect();
        list.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(list)
    }

    async fn get_category(&self, id: &Uuid) -> AppResult<Option<Category>> {
        let categories = self.categories.read().map_err(lock_error)?;
        Ok(categories.get(id).cloned())
    }

    async fn create_category(&self, category: Category) -> AppResult<Category> {
        let mut categories = self.categories.write().map_err(lock_error)?;
        if categories.contains_key(&category.id) {
            return Err(EntityError::AlreadyExists {
                entity_type: "category".to_string(),
                id: category.id,
            }
            .into());
        }
        categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn list_materials(&self, filter: &MaterialFilter) -> AppResult<Vec<Material>> {
        let order = self.display_orders()?;
        let materials = self.materials.read().map_err(lock_error)?;

        let mut list: Vec<Material> = materials
            .values()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect();
        list.sort_by(|a, b| {
            let rank_a = order.get(&a.category_id).copied().unwrap_or(i32::MAX);
            let rank_b = order.get(&b.category_id).copied().unwrap_or(i32::MAX);
            rank_a
                .cmp(&rank_b)
                .then_with(|| code_sort_key(&a.code).cmp(&code_sort_key(&b.code)))
        });
        Ok(list)
    }

    async fn get_material(&self, id: &Uuid) -> AppResult<Option<Material>> {
        let materials = self.materials.read().map_err(lock_error)?;
        Ok(materials.get(id).cloned())
    }

    async fn create_material(&self, material: NewMaterial) -> AppResult<Material> {
        let prefix = self
            .get_category(&material.category_id)
            .await?
            .map(|c| c.code_prefix)
            .ok_or_else(|| AppError::not_found("category", material.category_id))?;

        let mut materials = self.materials.write().map_err(lock_error)?;
        let code = next_material_code(&prefix, materials.values().map(|m| m.code.as_str()));

        let created = Material {
            id: Uuid::new_v4(),
            code,
            name: material.name,
            category_id: material.category_id,
            size: material.size,
            kind: material.kind,
            weight_kg: material.weight_kg,
            active: true,
            scope: material.scope,
            created_at: Utc::now(),
        };
        materials.insert(created.id, created.clone());
        Ok(created)
    }

    async fn delete_materials_for_order(&self, order_id: &Uuid) -> AppResult<usize> {
        let mut materials = self.materials.write().map_err(lock_error)?;
        let before = materials.len();
        materials.retain(|_, m| m.scope.draft_order() != Some(*order_id));
        Ok(before - materials.len())
    }

    async fn create_order(&self, owner: &UserIdentity, order: NewOrder) -> AppResult<Order> {
        let mut orders = self.orders.write().map_err(lock_error)?;

        let id = order.id.unwrap_or_else(Uuid::new_v4);
        if orders.contains_key(&id) {
            return Err(EntityError::AlreadyExists {
                entity_type: "order".to_string(),
                id,
            }
            .into());
        }

        let now = Utc::now();
        let mut order_number = generate_order_number(&owner.username, now);
        while orders.values().any(|o| o.order_number == order_number) {
            order_number = generate_order_number(&owner.username, now);
        }

        let created = Order {
            id,
            order_number,
            owner_id: owner.id,
            status: order.status,
            document: order.document,
            created_at: now,
            updated_at: now,
        };
        orders.insert(id, created.clone());
        Ok(created)
    }

    async fn get_order(&self, id: &Uuid) -> AppResult<Option<Order>> {
        let orders = self.orders.read().map_err(lock_error)?;
        Ok(orders.get(id).cloned())
    }

    async fn list_orders(&self, owner_id: &Uuid) -> AppResult<Vec<Order>> {
        let orders = self.orders.read().map_err(lock_error)?;
        let mut list: Vec<Order> = orders
            .values()
            .filter(|o| o.is_owned_by(owner_id))
            .cloned()
            .collect();
        list.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.order_number.cmp(&a.order_number))
        });
        Ok(list)
    }

    async fn update_order(&self, id: &Uuid, document: OrderDocument) -> AppResult<Order> {
        let mut orders = self.orders.write().map_err(lock_error)?;
        let order = orders
            .get_mut(id)
            .ok_or_else(|| AppError::not_found("order", *id))?;
        order.document = document;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn set_order_status(&self, id: &Uuid, status: OrderStatus) -> AppResult<Order> {
        let mut orders = self.orders.write().map_err(lock_error)?;
        let order = orders
            .get_mut(id)
            .ok_or_else(|| AppError::not_found("order", *id))?;
        order.status = status;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn delete_order(&self, id: &Uuid) -> AppResult<()> {
        let mut orders = self.orders.write().map_err(lock_error)?;
        orders
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found("order", *id))
    }
}
