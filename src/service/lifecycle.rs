//! Order lifecycle: create, read, update, copy, delete and print
//!
//! Every operation on an existing order verifies ownership first. A missing
//! order is `NotFound`; another user's order is `Forbidden`.

use crate::core::aggregate::{Aggregate, CatalogSnapshot, Selection, aggregate_with};
use crate::core::error::{AppError, AppResult, RequestError, ValidationError};
use crate::core::model::{
    Category, Material, MaterialScope, NewMaterial, NewOrder, Order, OrderDocument,
    OrderStatus, UserIdentity,
};
use crate::core::store::{MaterialFilter, Store};
use crate::core::validation::{MaterialInput, OrderInput};
use crate::print::render::local_date;
use crate::print::{LayoutSettings, PrintOptions, render_printable};
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

/// Type given to ad-hoc materials created without one
pub const DEFAULT_MATERIAL_KIND: &str = "標準";

/// Filters for the order history
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OrderQuery {
    #[serde(default)]
    pub status: Option<OrderStatus>,
    /// Case-insensitive search over order number, site and orderer
    #[serde(default)]
    pub q: Option<String>,
}

/// Dashboard counters for one user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OrderStats {
    pub total: usize,
    pub this_month: usize,
    pub completed: usize,
    pub pending: usize,
}

/// Service fronting the store for order and catalog operations
#[derive(Clone)]
pub struct OrderLifecycleService {
    store: Arc<dyn Store>,
    layout: LayoutSettings,
}

impl OrderLifecycleService {
    pub fn new(store: Arc<dyn Store>, layout: LayoutSettings) -> Self {
        Self { store, layout }
    }

    pub fn layout(&self) -> &LayoutSettings {
        &self.layout
    }

    /// Fetch an order and verify the caller owns it
    async fn fetch_owned(&self, user: &UserIdentity, id: &Uuid) -> AppResult<Order> {
        let order = self
            .store
            .get_order(id)
            .await?
            .ok_or_else(|| AppError::not_found("order", *id))?;

        if !order.is_owned_by(&user.id) {
            tracing::warn!(order_id = %id, user = %user.username, "access to foreign order denied");
            return Err(RequestError::Forbidden {
                message: "this order belongs to another user".to_string(),
            }
            .into());
        }
        Ok(order)
    }

    /// A draft id may only reference an order the caller owns (or none yet)
    async fn check_draft_access(&self, user: &UserIdentity, draft: Option<Uuid>) -> AppResult<()> {
        if let Some(id) = draft {
            if self.store.get_order(&id).await?.is_some() {
                self.fetch_owned(user, &id).await?;
            }
        }
        Ok(())
    }

    async fn snapshot(&self, materials: Vec<Material>) -> AppResult<CatalogSnapshot> {
        let categories = self.store.list_categories().await?;
        Ok(CatalogSnapshot::new(categories, materials))
    }

    /// Aggregate input lines against a snapshot, rejecting empty results
    fn aggregate_input(snapshot: &CatalogSnapshot, input: &OrderInput) -> AppResult<Aggregate> {
        let selection = Selection::from_lines(input.positive_lines());
        Self::non_empty(snapshot.aggregate(&selection))
    }

    fn non_empty(aggregate: Aggregate) -> AppResult<Aggregate> {
        if aggregate.items.is_empty() {
            return Err(AppError::field(
                "items",
                "none of the selected materials is available",
            ));
        }
        Ok(aggregate)
    }

    fn document(input: OrderInput, aggregate: Aggregate, order_date: DateTime<Utc>) -> OrderDocument {
        OrderDocument {
            orderer_name: input.orderer_name,
            site_name: input.site_name,
            contact_info: input.contact_info,
            loading_date: input.loading_date,
            order_date,
            note: input.note,
            items: aggregate.items,
            total_weight: aggregate.total_weight,
        }
    }

    /// Aggregate and persist a new order
    pub async fn create(&self, user: &UserIdentity, input: OrderInput) -> AppResult<Order> {
        let input = input.check()?;
        self.check_draft_access(user, input.draft_id).await?;

        let materials = self
            .store
            .list_materials(&MaterialFilter::for_draft(input.draft_id))
            .await?;
        let snapshot = self.snapshot(materials).await?;
        let aggregate = Self::aggregate_input(&snapshot, &input)?;

        let id = input.draft_id;
        let order_date = input.order_date.unwrap_or_else(Utc::now);
        let order = self
            .store
            .create_order(
                user,
                NewOrder {
                    id,
                    status: OrderStatus::Pending,
                    document: Self::document(input, aggregate, order_date),
                },
            )
            .await?;

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            items = order.document.items.len(),
            total_weight = order.document.total_weight,
            "order created"
        );
        Ok(order)
    }

    pub async fn get(&self, user: &UserIdentity, id: &Uuid) -> AppResult<Order> {
        self.fetch_owned(user, id).await
    }

    /// The caller's orders, newest first
    pub async fn list(&self, user: &UserIdentity, query: &OrderQuery) -> AppResult<Vec<Order>> {
        let orders = self.store.list_orders(&user.id).await?;
        let needle = query.q.as_deref().unwrap_or("");
        Ok(orders
            .into_iter()
            .filter(|o| query.status.is_none_or(|s| o.status == s))
            .filter(|o| o.matches_search(needle))
            .collect())
    }

    /// Replace an order's header and lines
    ///
    /// Materials deactivated since the order was placed remain usable for
    /// lines already on the order.
    pub async fn update(&self, user: &UserIdentity, id: &Uuid, input: OrderInput) -> AppResult<Order> {
        let input = input.check()?;
        let existing = self.fetch_owned(user, id).await?;

        let on_order: HashSet<Uuid> = existing
            .document
            .items
            .iter()
            .map(|i| i.material_id)
            .collect();
        let mut materials: Vec<Material> = self
            .store
            .list_materials(&MaterialFilter {
                active: None,
                temporary_for: Some(*id),
            })
            .await?
            .into_iter()
            .filter(|m| m.active || on_order.contains(&m.id))
            .collect();

        // lines whose material no longer exists keep their snapshot
        let known: HashSet<Uuid> = materials.iter().map(|m| m.id).collect();
        let categories = self.store.list_categories().await?;
        for item in existing.document.items.iter().filter(|i| !known.contains(&i.material_id)) {
            materials.push(Material::stand_in(item, &categories, existing.created_at));
        }

        let previous: HashMap<Uuid, &str> = existing
            .document
            .items
            .iter()
            .map(|i| (i.material_id, i.category_name.as_str()))
            .collect();
        let snapshot = CatalogSnapshot::new(categories, materials);
        let selection = Selection::from_lines(input.positive_lines());
        let aggregate = Self::non_empty(aggregate_with(&selection, &snapshot.materials, |m| {
            snapshot
                .category(&m.category_id)
                .map(|c| c.name.clone())
                .or_else(|| previous.get(&m.id).map(|name| name.to_string()))
                .unwrap_or_default()
        }))?;
        let order_date = input.order_date.unwrap_or(existing.document.order_date);

        let order = self
            .store
            .update_order(id, Self::document(input, aggregate, order_date))
            .await?;

        tracing::info!(order_id = %id, items = order.document.items.len(), "order updated");
        Ok(order)
    }

    /// Delete an order together with its draft-scoped materials
    pub async fn delete(&self, user: &UserIdentity, id: &Uuid) -> AppResult<()> {
        self.fetch_owned(user, id).await?;
        self.store.delete_order(id).await?;
        let removed = self.store.delete_materials_for_order(id).await?;

        tracing::info!(order_id = %id, draft_materials = removed, "order deleted");
        Ok(())
    }

    /// Duplicate an order under a new identity
    ///
    /// Draft-scoped materials of the source are re-created under the copy so
    /// that deleting the source leaves the copy intact.
    pub async fn copy(&self, user: &UserIdentity, id: &Uuid) -> AppResult<Order> {
        let source = self.fetch_owned(user, id).await?;
        let copy_id = Uuid::new_v4();

        let mut remapped: HashMap<Uuid, Uuid> = HashMap::new();
        for item in &source.document.items {
            if remapped.contains_key(&item.material_id) {
                continue;
            }
            let Some(material) = self.store.get_material(&item.material_id).await? else {
                continue;
            };
            if material.scope.draft_order() != Some(source.id) {
                continue;
            }
            let duplicate = self
                .store
                .create_material(NewMaterial::duplicate_of(
                    &material,
                    MaterialScope::DraftScoped { order_id: copy_id },
                ))
                .await?;
            remapped.insert(material.id, duplicate.id);
        }

        let mut document = source.document.clone();
        for item in &mut document.items {
            if let Some(new_id) = remapped.get(&item.material_id) {
                item.material_id = *new_id;
            }
        }
        document.order_date = Utc::now();
        document.total_weight = document.recomputed_total();

        let order = self
            .store
            .create_order(
                user,
                NewOrder {
                    id: Some(copy_id),
                    status: OrderStatus::Pending,
                    document,
                },
            )
            .await?;

        tracing::info!(
            source_id = %id,
            order_id = %order.id,
            draft_materials = remapped.len(),
            "order copied"
        );
        Ok(order)
    }

    /// Render an order for printing and mark it completed
    pub async fn print(&self, user: &UserIdentity, id: &Uuid, options: &PrintOptions) -> AppResult<String> {
        let order = self.fetch_owned(user, id).await?;
        let html = render_printable(&order.document, options, &self.layout);

        if order.status != OrderStatus::Completed {
            self.store.set_order_status(id, OrderStatus::Completed).await?;
            tracing::info!(order_id = %id, "order printed, marked completed");
        }
        Ok(html)
    }

    /// Render an unsaved order without persisting anything
    pub async fn preview(
        &self,
        user: &UserIdentity,
        input: OrderInput,
        options: &PrintOptions,
    ) -> AppResult<String> {
        let input = input.check()?;
        self.check_draft_access(user, input.draft_id).await?;

        let materials = self
            .store
            .list_materials(&MaterialFilter::for_draft(input.draft_id))
            .await?;
        let snapshot = self.snapshot(materials).await?;
        let aggregate = Self::aggregate_input(&snapshot, &input)?;
        let order_date = input.order_date.unwrap_or_else(Utc::now);

        let document = Self::document(input, aggregate, order_date);
        Ok(render_printable(&document, options, &self.layout))
    }

    /// Order counters for the dashboard
    pub async fn stats(&self, user: &UserIdentity, now: DateTime<Utc>) -> AppResult<OrderStats> {
        let orders = self.store.list_orders(&user.id).await?;
        let offset = self.layout.utc_offset_hours;
        let today = local_date(now, offset);

        let mut stats = OrderStats {
            total: orders.len(),
            ..OrderStats::default()
        };
        for order in &orders {
            let created = local_date(order.created_at, offset);
            if created.year() == today.year() && created.month() == today.month() {
                stats.this_month += 1;
            }
            match order.status {
                OrderStatus::Completed => stats.completed += 1,
                OrderStatus::Pending => stats.pending += 1,
            }
        }
        Ok(stats)
    }

    // === Catalog ===

    pub async fn list_categories(&self) -> AppResult<Vec<Category>> {
        self.store.list_categories().await
    }

    /// Active materials, plus the draft-scoped ones of `temporary_for`
    pub async fn list_materials(
        &self,
        user: &UserIdentity,
        temporary_for: Option<Uuid>,
    ) -> AppResult<Vec<Material>> {
        self.check_draft_access(user, temporary_for).await?;
        self.store
            .list_materials(&MaterialFilter::for_draft(temporary_for))
            .await
    }

    /// Validate and create a catalog material
    ///
    /// Draft-scoped materials may only be added to the catch-all category.
    pub async fn create_material(&self, user: &UserIdentity, input: MaterialInput) -> AppResult<Material> {
        let input = input.check()?;
        let category = self
            .store
            .get_category(&input.category_id)
            .await?
            .ok_or_else(|| AppError::not_found("category", input.category_id))?;

        if input.temporary_for.is_some() && !category.catch_all {
            return Err(ValidationError::FieldError {
                field: "category_id".to_string(),
                message: format!("materials cannot be added to category '{}'", category.name),
            }
            .into());
        }
        self.check_draft_access(user, input.temporary_for).await?;

        let scope = match input.temporary_for {
            Some(order_id) => MaterialScope::DraftScoped { order_id },
            None => MaterialScope::Permanent,
        };
        let material = self
            .store
            .create_material(NewMaterial {
                name: input.name,
                category_id: category.id,
                size: input.size,
                kind: input.kind.or_else(|| Some(DEFAULT_MATERIAL_KIND.to_string())),
                weight_kg: input.weight_kg,
                scope,
            })
            .await?;

        tracing::info!(
            material_id = %material.id,
            code = %material.code,
            temporary = material.scope.is_temporary(),
            "material created"
        );
        Ok(material)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::validation::OrderLineInput;
    use crate::storage::{InMemoryStore, seed_catalog};

    fn user(username: &str) -> UserIdentity {
        UserIdentity {
            id: Uuid::new_v4(),
            username: username.to_string(),
            display_name: username.to_string(),
        }
    }

    fn input(lines: &[(Uuid, u32)]) -> OrderInput {
        OrderInput {
            orderer_name: "山田".to_string(),
            site_name: Some("新宿現場".to_string()),
            contact_info: None,
            loading_date: None,
            order_date: None,
            note: None,
            items: lines
                .iter()
                .map(|&(material_id, quantity)| OrderLineInput {
                    material_id,
                    quantity,
                })
                .collect(),
            draft_id: None,
        }
    }

    async fn setup() -> (InMemoryStore, OrderLifecycleService, Vec<Material>) {
        let store = InMemoryStore::new();
        seed_catalog(&store).await.unwrap();
        let service = OrderLifecycleService::new(Arc::new(store.clone()), LayoutSettings::default());
        let materials = store.list_materials(&MaterialFilter::active()).await.unwrap();
        (store, service, materials)
    }

    #[tokio::test]
    async fn test_create_aggregates_and_snapshots() {
        let (_, service, materials) = setup().await;
        let owner = user("demo");

        let order = service
            .create(&owner, input(&[(materials[0].id, 10), (materials[1].id, 0)]))
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.document.items.len(), 1);
        assert_eq!(order.document.items[0].weight_per_unit, materials[0].weight_kg);
        assert_eq!(order.document.total_weight, round(materials[0].weight_kg * 10.0));
    }

    fn round(x: f64) -> f64 {
        crate::core::weight::round4(x)
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_materials_only() {
        let (_, service, _) = setup().await;
        let owner = user("demo");

        let err = service
            .create(&owner, input(&[(Uuid::new_v4(), 3)]))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_keeps_deactivated_material_on_order() {
        let (store, service, materials) = setup().await;
        let owner = user("demo");
        let kept = &materials[0];
        let order = service
            .create(&owner, input(&[(kept.id, 2)]))
            .await
            .unwrap();

        store.set_material_active(&kept.id, false).unwrap();

        let updated = service
            .update(&owner, &order.id, input(&[(kept.id, 5), (materials[2].id, 1)]))
            .await
            .unwrap();
        assert_eq!(updated.document.items.len(), 2);
        assert_eq!(updated.document.items[0].quantity, 5);
        assert_eq!(updated.document.items[0].category_name, "枠");

        // a different order cannot pick up the inactive material
        let err = service
            .create(&owner, input(&[(kept.id, 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_print_marks_completed_once() {
        let (_, service, materials) = setup().await;
        let owner = user("demo");
        let order = service
            .create(&owner, input(&[(materials[0].id, 1)]))
            .await
            .unwrap();

        let first = service.print(&owner, &order.id, &PrintOptions::default()).await.unwrap();
        let second = service.print(&owner, &order.id, &PrintOptions::default()).await.unwrap();

        assert_eq!(first, second);
        let reloaded = service.get(&owner, &order.id).await.unwrap();
        assert_eq!(reloaded.status, OrderStatus::Completed);
    }

    #[tokio::test]
    async fn test_copy_resets_status_and_keeps_lines() {
        let (_, service, materials) = setup().await;
        let owner = user("demo");
        let order = service
            .create(&owner, input(&[(materials[0].id, 4)]))
            .await
            .unwrap();
        service.print(&owner, &order.id, &PrintOptions::default()).await.unwrap();

        let copy = service.copy(&owner, &order.id).await.unwrap();

        assert_ne!(copy.id, order.id);
        assert_ne!(copy.order_number, order.order_number);
        assert_eq!(copy.status, OrderStatus::Pending);
        assert_eq!(copy.document.items, order.document.items);
        assert_eq!(copy.document.total_weight, order.document.total_weight);
    }

    #[tokio::test]
    async fn test_delete_removes_draft_materials() {
        let (store, service, _) = setup().await;
        let owner = user("demo");
        let catch_all = store
            .list_categories()
            .await
            .unwrap()
            .into_iter()
            .find(|c| c.catch_all)
            .unwrap();
        let draft = Uuid::new_v4();

        let material = service
            .create_material(
                &owner,
                MaterialInput {
                    name: "特注金物".to_string(),
                    category_id: catch_all.id,
                    size: None,
                    kind: None,
                    weight_kg: 2.5,
                    temporary_for: Some(draft),
                },
            )
            .await
            .unwrap();
        assert_eq!(material.kind.as_deref(), Some(DEFAULT_MATERIAL_KIND));
        assert_eq!(material.code, "OT-017");

        let mut order_input = input(&[(material.id, 2)]);
        order_input.draft_id = Some(draft);
        let order = service.create(&owner, order_input).await.unwrap();
        assert_eq!(order.id, draft);

        service.delete(&owner, &order.id).await.unwrap();

        assert!(store.get_material(&material.id).await.unwrap().is_none());
        assert!(store.get_order(&order.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stats_count_by_status() {
        let (_, service, materials) = setup().await;
        let owner = user("demo");
        let other = user("guest");
        for _ in 0..3 {
            service
                .create(&owner, input(&[(materials[0].id, 1)]))
                .await
                .unwrap();
        }
        let printed = service
            .create(&owner, input(&[(materials[0].id, 1)]))
            .await
            .unwrap();
        service.print(&owner, &printed.id, &PrintOptions::default()).await.unwrap();
        service
            .create(&other, input(&[(materials[0].id, 1)]))
            .await
            .unwrap();

        let stats = service.stats(&owner, Utc::now()).await.unwrap();

        assert_eq!(
            stats,
            OrderStats {
                total: 4,
                this_month: 4,
                completed: 1,
                pending: 3,
            }
        );
    }

    #[tokio::test]
    async fn test_list_filters() {
        let (_, service, materials) = setup().await;
        let owner = user("demo");
        let order = service
            .create(&owner, input(&[(materials[0].id, 1)]))
            .await
            .unwrap();
        service.print(&owner, &order.id, &PrintOptions::default()).await.unwrap();
        service
            .create(&owner, input(&[(materials[0].id, 1)]))
            .await
            .unwrap();

        let completed = OrderQuery {
            status: Some(OrderStatus::Completed),
            q: None,
        };
        assert_eq!(service.list(&owner, &completed).await.unwrap().len(), 1);

        let by_number = OrderQuery {
            status: None,
            q: Some(order.order_number.to_lowercase()),
        };
        let found = service.list(&owner, &by_number).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, order.id);
    }
}
