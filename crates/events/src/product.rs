use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use catalog_categories::AttributeRole;
use catalog_core::{AggregateRoot, AttributeId, CategoryId, ProductId};
use catalog_products::{AttributeValue, Product};

use crate::event::Event;
use crate::snapshot::AttributeSnapshot;

pub const PRODUCT_CREATED: &str = "catalog.product.created";
pub const PRODUCT_UPDATED: &str = "catalog.product.updated";

/// A product attribute value with its attribute (and category role) copied in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductAttributePayload {
    pub attribute_id: AttributeId,
    pub option_slug_value: Option<String>,
    pub option_slug_values: Vec<String>,
    pub numeric_value: Option<f64>,
    pub text_value: Option<String>,
    pub boolean_value: Option<bool>,
    pub attribute: Option<AttributeSnapshot>,
    /// Set when the product's category assigns this attribute.
    pub role: Option<AttributeRole>,
    pub sort_order: Option<i32>,
}

impl ProductAttributePayload {
    pub fn new(value: &AttributeValue, attribute: Option<AttributeSnapshot>) -> Self {
        Self {
            attribute_id: value.attribute_id,
            option_slug_value: value.option_slug_value.clone(),
            option_slug_values: value.option_slug_values.clone(),
            numeric_value: value.numeric_value,
            text_value: value.text_value.clone(),
            boolean_value: value.boolean_value,
            attribute,
            role: None,
            sort_order: None,
        }
    }

    pub fn with_category_role(mut self, role: AttributeRole, sort_order: i32) -> Self {
        self.role = Some(role);
        self.sort_order = Some(sort_order);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPayload {
    pub product_id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub quantity: i32,
    pub enabled: bool,
    pub version: u64,
    pub image_id: Option<String>,
    pub category_id: Option<CategoryId>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub attributes: Vec<ProductAttributePayload>,
}

impl ProductPayload {
    pub fn new(product: &Product, attributes: Vec<ProductAttributePayload>) -> Self {
        Self {
            product_id: product.id_typed(),
            name: product.name().to_string(),
            description: product.description().map(str::to_string),
            price: product.price(),
            quantity: product.quantity(),
            enabled: product.enabled(),
            version: product.version(),
            image_id: product.image_id().map(str::to_string),
            category_id: product.category_id(),
            created_at: product.created_at(),
            modified_at: product.modified_at(),
            attributes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductCreated(pub ProductPayload);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductUpdated(pub ProductPayload);

impl Event for ProductCreated {
    fn event_type(&self) -> &'static str {
        PRODUCT_CREATED
    }

    fn partition_key(&self) -> String {
        self.0.product_id.to_string()
    }
}

impl Event for ProductUpdated {
    fn event_type(&self) -> &'static str {
        PRODUCT_UPDATED
    }

    fn partition_key(&self) -> String {
        self.0.product_id.to_string()
    }
}
