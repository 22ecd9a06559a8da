//! Typed request inputs for orders and materials

use super::filters::{optional_text, trim};
use super::validators::{not_blank, unit_weight};
use crate::core::error::{FieldValidationError, ValidationError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// One requested `(material, quantity)` line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineInput {
    pub material_id: Uuid,
    pub quantity: u32,
}

/// Order header and lines as submitted by the order form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct OrderInput {
    #[validate(
        custom(function = "not_blank"),
        length(max = 100, message = "must be at most 100 characters")
    )]
    pub orderer_name: String,

    #[serde(default)]
    #[validate(length(max = 200, message = "must be at most 200 characters"))]
    pub site_name: Option<String>,

    #[serde(default)]
    #[validate(length(max = 200, message = "must be at most 200 characters"))]
    pub contact_info: Option<String>,

    #[serde(default)]
    pub loading_date: Option<NaiveDate>,

    /// Defaults to the submission time
    #[serde(default)]
    pub order_date: Option<DateTime<Utc>>,

    #[serde(default)]
    #[validate(length(max = 2000, message = "must be at most 2000 characters"))]
    pub note: Option<String>,

    #[serde(default)]
    #[validate(length(min = 1, message = "select at least one material"))]
    pub items: Vec<OrderLineInput>,

    /// Id reserved for a new order that already owns draft-scoped materials
    #[serde(default)]
    pub draft_id: Option<Uuid>,
}

impl OrderInput {
    /// Trim text fields and drop blank optional ones
    pub fn normalized(mut self) -> Self {
        self.orderer_name = trim(&self.orderer_name);
        self.site_name = optional_text(self.site_name);
        self.contact_info = optional_text(self.contact_info);
        self.note = optional_text(self.note);
        self
    }

    /// Normalize and validate, returning the cleaned input
    pub fn check(self) -> Result<Self, ValidationError> {
        let input = self.normalized();
        input.validate()?;
        Ok(input)
    }

    /// Lines with a positive quantity
    pub fn positive_lines(&self) -> impl Iterator<Item = (Uuid, u32)> + '_ {
        self.items
            .iter()
            .filter(|line| line.quantity > 0)
            .map(|line| (line.material_id, line.quantity))
    }
}

/// A new catalog material, optionally scoped to a draft order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct MaterialInput {
    #[validate(
        custom(function = "not_blank"),
        length(max = 100, message = "must be at most 100 characters")
    )]
    pub name: String,

    pub category_id: Uuid,

    #[serde(default)]
    #[validate(length(max = 50, message = "must be at most 50 characters"))]
    pub size: Option<String>,

    #[serde(default, rename = "type")]
    #[validate(length(max = 50, message = "must be at most 50 characters"))]
    pub kind: Option<String>,

    pub weight_kg: f64,

    /// Draft order this material belongs to; `None` creates a permanent one
    #[serde(default)]
    pub temporary_for: Option<Uuid>,
}

impl MaterialInput {
    pub fn normalized(mut self) -> Self {
        self.name = trim(&self.name);
        self.size = optional_text(self.size);
        self.kind = optional_text(self.kind);
        self
    }

    /// Normalize and validate, collecting every field error
    pub fn check(self) -> Result<Self, ValidationError> {
        let input = self.normalized();

        let mut fields = match input.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => match ValidationError::from(errors) {
                ValidationError::FieldErrors(fields) => fields,
                other => return Err(other),
            },
        };

        if let Err(err) = unit_weight(input.weight_kg) {
            fields.push(FieldValidationError {
                field: "weight_kg".to_string(),
                message: err
                    .message
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string()),
            });
        }

        if fields.is_empty() {
            Ok(input)
        } else {
            Err(ValidationError::FieldErrors(fields))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_input() -> OrderInput {
        OrderInput {
            orderer_name: "  山田 ".to_string(),
            site_name: Some("".to_string()),
            contact_info: Some(" 090-0000-0000 ".to_string()),
            loading_date: None,
            order_date: None,
            note: None,
            items: vec![OrderLineInput {
                material_id: Uuid::new_v4(),
                quantity: 2,
            }],
            draft_id: None,
        }
    }

    #[test]
    fn test_order_input_normalized() {
        let input = order_input().check().unwrap();
        assert_eq!(input.orderer_name, "山田");
        assert_eq!(input.site_name, None);
        assert_eq!(input.contact_info.as_deref(), Some("090-0000-0000"));
    }

    #[test]
    fn test_order_input_requires_orderer_and_items() {
        let mut input = order_input();
        input.orderer_name = "   ".to_string();
        input.items.clear();

        let err = input.check().unwrap_err();
        assert_eq!(err.fields(), vec!["items", "orderer_name"]);
    }

    #[test]
    fn test_order_input_deserializes_with_defaults() {
        let id = Uuid::new_v4();
        let json = serde_json::json!({
            "orderer_name": "山田",
            "items": [{ "material_id": id, "quantity": 3 }]
        });
        let input: OrderInput = serde_json::from_value(json).unwrap();
        assert_eq!(input.items.len(), 1);
        assert!(input.draft_id.is_none());
        assert!(input.order_date.is_none());
    }

    #[test]
    fn test_negative_quantity_rejected_by_type() {
        let json = serde_json::json!({
            "orderer_name": "山田",
            "items": [{ "material_id": Uuid::new_v4(), "quantity": -1 }]
        });
        assert!(serde_json::from_value::<OrderInput>(json).is_err());
    }

    #[test]
    fn test_positive_lines_skip_zero() {
        let mut input = order_input();
        input.items.push(OrderLineInput {
            material_id: Uuid::new_v4(),
            quantity: 0,
        });
        assert_eq!(input.positive_lines().count(), 1);
    }

    #[test]
    fn test_material_input_weight_must_be_positive() {
        let input = MaterialInput {
            name: "単管ジョイント".to_string(),
            category_id: Uuid::new_v4(),
            size: None,
            kind: Some(" ".to_string()),
            weight_kg: 0.0,
            temporary_for: None,
        };
        let err = input.check().unwrap_err();
        assert_eq!(err.fields(), vec!["weight_kg"]);
    }

    #[test]
    fn test_material_input_collects_all_fields() {
        let input = MaterialInput {
            name: "".to_string(),
            category_id: Uuid::new_v4(),
            size: None,
            kind: None,
            weight_kg: -2.0,
            temporary_for: None,
        };
        let err = input.check().unwrap_err();
        assert_eq!(err.fields(), vec!["name", "weight_kg"]);
    }
}
