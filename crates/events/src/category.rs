use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use catalog_categories::{AttributeRole, Category, CategoryAttribute};
use catalog_core::{AggregateRoot, AttributeId, CategoryId};

use crate::event::Event;
use crate::snapshot::AttributeSnapshot;

pub const CATEGORY_CREATED: &str = "catalog.category.created";
pub const CATEGORY_UPDATED: &str = "catalog.category.updated";

/// One attribute assignment, with the attribute copied in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryAttributePayload {
    pub attribute_id: AttributeId,
    pub slug: String,
    pub role: AttributeRole,
    pub required: bool,
    pub sort_order: i32,
    pub filterable: bool,
    pub searchable: bool,
    /// `None` only if the attribute was not resolved by the command.
    pub attribute: Option<AttributeSnapshot>,
}

impl CategoryAttributePayload {
    pub fn new(assignment: &CategoryAttribute, attribute: Option<AttributeSnapshot>) -> Self {
        Self {
            attribute_id: assignment.attribute_id,
            slug: assignment.slug.clone(),
            role: assignment.role,
            required: assignment.required,
            sort_order: assignment.sort_order,
            filterable: assignment.filterable,
            searchable: assignment.searchable,
            attribute,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPayload {
    pub category_id: CategoryId,
    pub name: String,
    pub enabled: bool,
    pub attributes: Vec<CategoryAttributePayload>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl CategoryPayload {
    pub fn new(category: &Category, attributes: Vec<CategoryAttributePayload>) -> Self {
        Self {
            category_id: category.id_typed(),
            name: category.name().to_string(),
            enabled: category.enabled(),
            attributes,
            version: category.version(),
            created_at: category.created_at(),
            modified_at: category.modified_at(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryCreated(pub CategoryPayload);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryUpdated(pub CategoryPayload);

impl Event for CategoryCreated {
    fn event_type(&self) -> &'static str {
        CATEGORY_CREATED
    }

    fn partition_key(&self) -> String {
        self.0.category_id.to_string()
    }
}

impl Event for CategoryUpdated {
    fn event_type(&self) -> &'static str {
        CATEGORY_UPDATED
    }

    fn partition_key(&self) -> String {
        self.0.category_id.to_string()
    }
}
