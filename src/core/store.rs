//! Persistence boundary for catalog and orders
//!
//! The store is plain CRUD keyed by id. Ownership checks live in the
//! lifecycle service; the store only generates identifiers, material codes
//! and order numbers.

use crate::core::error::AppResult;
use crate::core::model::{
    Category, Material, NewMaterial, NewOrder, Order, OrderDocument, OrderStatus, UserIdentity,
};
use async_trait::async_trait;
use uuid::Uuid;

/// Filter for [`Store::list_materials`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterialFilter {
    /// Restrict to active (`Some(true)`) or inactive materials
    pub active: Option<bool>,
    /// Also include the draft-scoped materials of this order
    pub temporary_for: Option<Uuid>,
}

impl MaterialFilter {
    /// Active permanent materials only
    pub fn active() -> Self {
        Self {
            active: Some(true),
            temporary_for: None,
        }
    }

    /// Active materials visible while editing `order_id`
    pub fn for_draft(order_id: Option<Uuid>) -> Self {
        Self {
            active: Some(true),
            temporary_for: order_id,
        }
    }

    pub fn matches(&self, material: &Material) -> bool {
        if self.active.is_some_and(|active| material.active != active) {
            return false;
        }
        match material.scope.draft_order() {
            None => true,
            Some(order_id) => self.temporary_for == Some(order_id),
        }
    }
}

/// Trait for catalog and order storage backends
#[async_trait]
pub trait Store: Send + Sync {
    /// Categories ordered by display order
    async fn list_categories(&self) -> AppResult<Vec<Category>>;

    async fn get_category(&self, id: &Uuid) -> AppResult<Option<Category>>;

    /// Insert a category as given
    async fn create_category(&self, category: Category) -> AppResult<Category>;

    /// Materials ordered by category display order, then code
    async fn list_materials(&self, filter: &MaterialFilter) -> AppResult<Vec<Material>>;

    async fn get_material(&self, id: &Uuid) -> AppResult<Option<Material>>;

    /// Create a material with the next `<prefix>-NNN` code of its category
    async fn create_material(&self, material: NewMaterial) -> AppResult<Material>;

    /// Remove the draft-scoped materials owned by an order, returning how many
    async fn delete_materials_for_order(&self, order_id: &Uuid) -> AppResult<usize>;

    /// Persist an order with a generated order number
    async fn create_order(&self, owner: &UserIdentity, order: NewOrder) -> AppResult<Order>;

    async fn get_order(&self, id: &Uuid) -> AppResult<Option<Order>>;

    /// Orders owned by a user, newest first
    async fn list_orders(&self, owner_id: &Uuid) -> AppResult<Vec<Order>>;

    /// Replace the document of an existing order
    async fn update_order(&self, id: &Uuid, document: OrderDocument) -> AppResult<Order>;

    async fn set_order_status(&self, id: &Uuid, status: OrderStatus) -> AppResult<Order>;

    /// Delete an order and its line items
    async fn delete_order(&self, id: &Uuid) -> AppResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::MaterialScope;
    use chrono::Utc;

    fn material(scope: MaterialScope, active: bool) -> Material {
        Material {
            id: Uuid::new_v4(),
            code: "OT-001".to_string(),
            name: "パイプ".to_string(),
            category_id: Uuid::new_v4(),
            size: None,
            kind: None,
            weight_kg: 1.0,
            active,
            scope,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_filter_active() {
        let filter = MaterialFilter::active();
        assert!(filter.matches(&material(MaterialScope::Permanent, true)));
        assert!(!filter.matches(&material(MaterialScope::Permanent, false)));
    }

    #[test]
    fn test_filter_draft_scope() {
        let order_id = Uuid::new_v4();
        let draft = material(MaterialScope::DraftScoped { order_id }, true);

        assert!(!MaterialFilter::active().matches(&draft));
        assert!(MaterialFilter::for_draft(Some(order_id)).matches(&draft));
        assert!(!MaterialFilter::for_draft(Some(Uuid::new_v4())).matches(&draft));
    }

    #[test]
    fn test_filter_any_activity() {
        let filter = MaterialFilter::default();
        assert!(filter.matches(&material(MaterialScope::Permanent, false)));
    }
}
