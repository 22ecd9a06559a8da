//! Order entry state machine
//!
//! Every input event updates the state and synchronously recomputes the
//! aggregate, so displayed line weights and the total are never stale.

use crate::core::aggregate::{Aggregate, CatalogSnapshot, Selection};
use crate::core::error::ValidationError;
use crate::core::model::{Category, Material, Order};
use crate::core::validation::filters::{clamp_quantity, optional_text, quantity_from_text};
use crate::core::validation::{MaterialInput, OrderInput, OrderLineInput};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// Header fields of the order being entered
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderHeader {
    pub orderer_name: String,
    pub site_name: Option<String>,
    pub contact_info: Option<String>,
    pub loading_date: Option<NaiveDate>,
    pub note: Option<String>,
}

/// Form state for creating or editing one order
#[derive(Debug, Clone)]
pub struct OrderFormController {
    catalog: CatalogSnapshot,
    active_category: Option<Uuid>,
    search: String,
    selection: Selection,
    aggregate: Aggregate,
    header: OrderHeader,
    draft_id: Option<Uuid>,
    editing: Option<(Uuid, DateTime<Utc>)>,
}

impl OrderFormController {
    /// Start a new order over a catalog snapshot; the first category is active
    pub fn new(mut catalog: CatalogSnapshot) -> Self {
        catalog.categories.sort_by_key(|c| c.display_order);
        let active_category = catalog.categories.first().map(|c| c.id);
        Self {
            catalog,
            active_category,
            search: String::new(),
            selection: Selection::new(),
            aggregate: Aggregate::default(),
            header: OrderHeader::default(),
            draft_id: None,
            editing: None,
        }
    }

    /// Start a new order whose id is already reserved
    pub fn with_draft_id(catalog: CatalogSnapshot, draft_id: Uuid) -> Self {
        let mut form = Self::new(catalog);
        form.draft_id = Some(draft_id);
        form
    }

    fn recompute(&mut self) {
        self.aggregate = self.catalog.aggregate(&self.selection);
    }

    /// Order whose draft-scoped materials are visible in this form
    pub fn scope_order(&self) -> Option<Uuid> {
        self.editing.map(|(id, _)| id).or(self.draft_id)
    }

    pub fn draft_id(&self) -> Option<Uuid> {
        self.draft_id
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn categories(&self) -> &[Category] {
        &self.catalog.categories
    }

    pub fn active_category(&self) -> Option<&Category> {
        self.active_category.and_then(|id| self.catalog.category(&id))
    }

    // === Navigation ===

    /// Switch the active category tab; unknown ids are ignored
    pub fn select_category(&mut self, category_id: Uuid) -> bool {
        if self.catalog.category(&category_id).is_some() {
            self.active_category = Some(category_id);
            true
        } else {
            false
        }
    }

    pub fn set_search(&mut self, text: &str) {
        self.search = text.to_string();
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Materials offered in the active category, filtered by the search text
    pub fn visible_materials(&self) -> Vec<&Material> {
        let scope = self.scope_order();
        self.catalog
            .materials
            .iter()
            .filter(|m| self.active_category.is_none_or(|id| m.category_id == id))
            .filter(|m| m.is_visible_for(scope))
            .filter(|m| m.matches_search(&self.search))
            .collect()
    }

    // === Quantities ===

    /// Set a quantity; negative values clamp to 0
    pub fn set_quantity(&mut self, material_id: Uuid, quantity: i64) {
        self.selection.set(material_id, clamp_quantity(quantity));
        self.recompute();
    }

    /// Set a quantity from raw field text; unparseable input counts as 0
    pub fn set_quantity_text(&mut self, material_id: Uuid, text: &str) {
        self.selection.set(material_id, quantity_from_text(text));
        self.recompute();
    }

    /// Step a quantity up or down, never below 0
    pub fn adjust_quantity(&mut self, material_id: Uuid, delta: i64) {
        let current = i64::from(self.selection.get(&material_id));
        self.set_quantity(material_id, current.saturating_add(delta));
    }

    pub fn quantity(&self, material_id: &Uuid) -> u32 {
        self.selection.get(material_id)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.recompute();
    }

    /// Current line weight for a material, 0 when not selected
    pub fn line_weight(&self, material_id: &Uuid) -> f64 {
        self.aggregate
            .items
            .iter()
            .find(|i| &i.material_id == material_id)
            .map(|i| i.total_weight)
            .unwrap_or(0.0)
    }

    pub fn totals(&self) -> &Aggregate {
        &self.aggregate
    }

    /// Number of materials with a positive quantity
    pub fn selected_count(&self) -> usize {
        self.selection.len()
    }

    // === Header ===

    pub fn header(&self) -> &OrderHeader {
        &self.header
    }

    pub fn set_orderer_name(&mut self, name: &str) {
        self.header.orderer_name = name.to_string();
    }

    pub fn set_site_name(&mut self, site: &str) {
        self.header.site_name = optional_text(Some(site.to_string()));
    }

    pub fn set_contact_info(&mut self, contact: &str) {
        self.header.contact_info = optional_text(Some(contact.to_string()));
    }

    pub fn set_loading_date(&mut self, date: Option<NaiveDate>) {
        self.header.loading_date = date;
    }

    pub fn set_note(&mut self, note: &str) {
        self.header.note = optional_text(Some(note.to_string()));
    }

    // === Ad-hoc materials ===

    /// Ad-hoc materials may only be added in the catch-all category
    pub fn can_add_material(&self) -> bool {
        self.active_category().is_some_and(|c| c.catch_all)
    }

    /// Build a material creation request for the active category
    ///
    /// A temporary material is scoped to this form's order, reserving a draft
    /// id first when the order has none yet.
    pub fn new_material_request(
        &mut self,
        name: &str,
        size: Option<&str>,
        kind: Option<&str>,
        weight_kg: f64,
        temporary: bool,
    ) -> Result<MaterialInput, ValidationError> {
        let category_id = match self.active_category() {
            Some(category) if category.catch_all => category.id,
            _ => {
                return Err(ValidationError::FieldError {
                    field: "category_id".to_string(),
                    message: "materials can only be added to the catch-all category".to_string(),
                });
            }
        };

        let temporary_for = if temporary {
            if self.scope_order().is_none() {
                self.draft_id = Some(Uuid::new_v4());
            }
            self.scope_order()
        } else {
            None
        };

        MaterialInput {
            name: name.to_string(),
            category_id,
            size: size.map(str::to_string),
            kind: kind.map(str::to_string),
            weight_kg,
            temporary_for,
        }
        .check()
    }

    /// Add a freshly created material to the snapshot
    pub fn insert_material(&mut self, material: Material) {
        match self.catalog.materials.iter_mut().find(|m| m.id == material.id) {
            Some(existing) => *existing = material,
            None => self.catalog.materials.push(material),
        }
        self.recompute();
    }

    // === Edit mode ===

    /// Load an existing order for editing
    ///
    /// Lines whose material left the catalog keep their snapshot weight: a
    /// stand-in entry built from the line is added to the snapshot.
    pub fn load_order(&mut self, order: &Order) {
        let doc = &order.document;
        self.editing = Some((order.id, doc.order_date));
        self.draft_id = None;
        self.header = OrderHeader {
            orderer_name: doc.orderer_name.clone(),
            site_name: doc.site_name.clone(),
            contact_info: doc.contact_info.clone(),
            loading_date: doc.loading_date,
            note: doc.note.clone(),
        };

        for item in &doc.items {
            if self.catalog.material(&item.material_id).is_none() {
                let stand_in = Material::stand_in(item, &self.catalog.categories, order.created_at);
                self.catalog.materials.push(stand_in);
            }
        }

        self.selection =
            Selection::from_lines(doc.items.iter().map(|i| (i.material_id, i.quantity)));
        self.recompute();
    }

    // === Submit ===

    /// Package the current state as a validated order input
    ///
    /// New orders are dated `now`; edits keep their original order date.
    pub fn submit(&self, now: DateTime<Utc>) -> Result<OrderInput, ValidationError> {
        let order_date = self.editing.map(|(_, date)| date).unwrap_or(now);
        let items = self
            .aggregate
            .items
            .iter()
            .map(|item| OrderLineInput {
                material_id: item.material_id,
                quantity: item.quantity,
            })
            .collect();

        OrderInput {
            orderer_name: self.header.orderer_name.clone(),
            site_name: self.header.site_name.clone(),
            contact_info: self.header.contact_info.clone(),
            loading_date: self.header.loading_date,
            order_date: Some(order_date),
            note: self.header.note.clone(),
            items,
            draft_id: if self.editing.is_some() { None } else { self.draft_id },
        }
        .check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{MaterialScope, OrderDocument, OrderLineItem, OrderStatus};

    struct Fixture {
        form: OrderFormController,
        frame: Category,
        other: Category,
        pipe: Material,
        clamp: Material,
        jack: Material,
    }

    fn category(name: &str, order: i32, catch_all: bool) -> Category {
        Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            display_order: order,
            code_prefix: "XX".to_string(),
            catch_all,
        }
    }

    fn material(code: &str, name: &str, category: &Category, weight: f64) -> Material {
        Material {
            id: Uuid::new_v4(),
            code: code.to_string(),
            name: name.to_string(),
            category_id: category.id,
            size: None,
            kind: Some("標準".to_string()),
            weight_kg: weight,
            active: true,
            scope: MaterialScope::Permanent,
            created_at: Utc::now(),
        }
    }

    fn fixture() -> Fixture {
        let other = category("その他", 4, true);
        let frame = category("枠", 1, false);
        let pipe = material("OT-008", "Pipe 2.0m", &other, 4.16);
        let clamp = material("OT-014", "Clamp", &other, 0.7);
        let jack = material("WK-011", "ジャッキベース", &frame, 3.7);
        let catalog = CatalogSnapshot::new(
            vec![other.clone(), frame.clone()],
            vec![jack.clone(), pipe.clone(), clamp.clone()],
        );
        Fixture {
            form: OrderFormController::new(catalog),
            frame,
            other,
            pipe,
            clamp,
            jack,
        }
    }

    #[test]
    fn test_first_category_by_display_order_is_active() {
        let f = fixture();
        assert_eq!(f.form.active_category().unwrap().id, f.frame.id);
        assert!(!f.form.can_add_material());
    }

    #[test]
    fn test_visible_materials_by_category_and_search() {
        let mut f = fixture();
        let names: Vec<_> = f.form.visible_materials().iter().map(|m| m.name.clone()).collect();
        assert_eq!(names, vec!["ジャッキベース"]);

        assert!(f.form.select_category(f.other.id));
        assert_eq!(f.form.visible_materials().len(), 2);

        f.form.set_search("PIPE");
        let names: Vec<_> = f.form.visible_materials().iter().map(|m| m.name.clone()).collect();
        assert_eq!(names, vec!["Pipe 2.0m"]);

        f.form.set_search("ot-014");
        assert_eq!(f.form.visible_materials()[0].id, f.clamp.id);

        assert!(!f.form.select_category(Uuid::new_v4()));
        assert_eq!(f.form.active_category().unwrap().id, f.other.id);
    }

    #[test]
    fn test_quantity_changes_recompute_totals() {
        let mut f = fixture();
        f.form.set_quantity(f.pipe.id, 3);
        f.form.set_quantity(f.clamp.id, 10);

        assert_eq!(f.form.line_weight(&f.pipe.id), 12.48);
        assert_eq!(f.form.line_weight(&f.clamp.id), 7.0);
        assert_eq!(f.form.totals().total_weight, 19.48);
        assert_eq!(f.form.selected_count(), 2);

        f.form.set_quantity(f.clamp.id, 0);
        assert_eq!(f.form.totals().total_weight, 12.48);
        assert_eq!(f.form.selected_count(), 1);
    }

    #[test]
    fn test_negative_and_garbage_quantities_clamp_to_zero() {
        let mut f = fixture();
        f.form.set_quantity(f.pipe.id, -5);
        assert_eq!(f.form.quantity(&f.pipe.id), 0);

        f.form.set_quantity_text(f.pipe.id, "NaN");
        assert_eq!(f.form.quantity(&f.pipe.id), 0);

        f.form.set_quantity_text(f.pipe.id, "4");
        assert_eq!(f.form.quantity(&f.pipe.id), 4);

        f.form.adjust_quantity(f.pipe.id, -10);
        assert_eq!(f.form.quantity(&f.pipe.id), 0);
        assert_eq!(f.form.totals().total_weight, 0.0);

        f.form.adjust_quantity(f.pipe.id, 1);
        f.form.adjust_quantity(f.pipe.id, 1);
        assert_eq!(f.form.quantity(&f.pipe.id), 2);
    }

    #[test]
    fn test_add_material_only_in_catch_all_category() {
        let mut f = fixture();
        let err = f
            .form
            .new_material_request("単管ジョイント", None, None, 0.6, true)
            .unwrap_err();
        assert_eq!(err.fields(), vec!["category_id"]);

        f.form.select_category(f.other.id);
        assert!(f.form.can_add_material());
        let request = f
            .form
            .new_material_request("単管ジョイント", None, None, 0.6, true)
            .unwrap();
        assert_eq!(request.category_id, f.other.id);
        assert!(request.temporary_for.is_some());
        assert_eq!(request.temporary_for, f.form.draft_id());

        let permanent = f
            .form
            .new_material_request("ベース金具", None, None, 1.2, false)
            .unwrap();
        assert!(permanent.temporary_for.is_none());
    }

    #[test]
    fn test_inserted_draft_material_is_visible_and_selectable() {
        let mut f = fixture();
        f.form.select_category(f.other.id);
        let request = f
            .form
            .new_material_request("単管ジョイント", None, None, 0.6, true)
            .unwrap();

        let mut created = material("OT-017", &request.name, &f.other, request.weight_kg);
        created.scope = MaterialScope::DraftScoped {
            order_id: request.temporary_for.unwrap(),
        };
        f.form.insert_material(created.clone());

        assert!(f.form.visible_materials().iter().any(|m| m.id == created.id));
        f.form.set_quantity(created.id, 5);
        assert_eq!(f.form.totals().total_weight, 3.0);
    }

    #[test]
    fn test_submit_requires_orderer_and_items() {
        let f = fixture();
        let err = f.form.submit(Utc::now()).unwrap_err();
        assert_eq!(err.fields(), vec!["items", "orderer_name"]);
    }

    #[test]
    fn test_submit_packages_selection_in_catalog_order() {
        let mut f = fixture();
        f.form.set_orderer_name(" 山田 ");
        f.form.set_site_name("  ");
        f.form.set_quantity(f.clamp.id, 10);
        f.form.set_quantity(f.jack.id, 2);

        let now = Utc::now();
        let input = f.form.submit(now).unwrap();
        assert_eq!(input.orderer_name, "山田");
        assert_eq!(input.site_name, None);
        assert_eq!(input.order_date, Some(now));
        let ids: Vec<_> = input.items.iter().map(|i| i.material_id).collect();
        assert_eq!(ids, vec![f.jack.id, f.clamp.id]);
    }

    #[test]
    fn test_load_order_keeps_snapshot_of_removed_material() {
        let mut f = fixture();
        let removed = Uuid::new_v4();
        let order_date: DateTime<Utc> = "2025-01-15T00:00:00Z".parse().unwrap();
        let order = Order {
            id: Uuid::new_v4(),
            order_number: "YAMADA-20250115-ABCDEF".to_string(),
            owner_id: Uuid::new_v4(),
            status: OrderStatus::Pending,
            document: OrderDocument {
                orderer_name: "山田".to_string(),
                site_name: Some("現場A".to_string()),
                contact_info: None,
                loading_date: None,
                order_date,
                note: None,
                items: vec![
                    OrderLineItem {
                        material_id: f.pipe.id,
                        name: f.pipe.name.clone(),
                        category_name: "その他".to_string(),
                        quantity: 3,
                        weight_per_unit: 4.16,
                        total_weight: 12.48,
                    },
                    OrderLineItem {
                        material_id: removed,
                        name: "旧クランプ".to_string(),
                        category_name: "その他".to_string(),
                        quantity: 2,
                        weight_per_unit: 0.9,
                        total_weight: 1.8,
                    },
                ],
                total_weight: 14.28,
            },
            created_at: order_date,
            updated_at: order_date,
        };

        f.form.load_order(&order);
        assert!(f.form.is_editing());
        assert_eq!(f.form.header().site_name.as_deref(), Some("現場A"));
        assert_eq!(f.form.quantity(&removed), 2);
        assert_eq!(f.form.totals().total_weight, 14.28);

        // the stand-in entry is not offered for new selection
        f.form.select_category(f.other.id);
        assert!(f.form.visible_materials().iter().all(|m| m.id != removed));

        let input = f.form.submit(Utc::now()).unwrap();
        assert_eq!(input.order_date, Some(order_date));
        assert!(input.draft_id.is_none());
    }
}
