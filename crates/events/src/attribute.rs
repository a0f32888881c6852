use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use catalog_attributes::{Attribute, AttributeOption, AttributeType};
use catalog_core::{AggregateRoot, AttributeId};

use crate::event::Event;

pub const ATTRIBUTE_UPDATED: &str = "catalog.attribute.updated";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributePayload {
    pub attribute_id: AttributeId,
    pub slug: String,
    pub name: String,
    #[serde(rename = "type")]
    pub attribute_type: AttributeType,
    pub unit: Option<String>,
    pub enabled: bool,
    pub version: u64,
    pub modified_at: DateTime<Utc>,
    pub options: Vec<AttributeOption>,
}

impl From<&Attribute> for AttributePayload {
    fn from(attribute: &Attribute) -> Self {
        Self {
            attribute_id: attribute.id_typed(),
            slug: attribute.slug().to_string(),
            name: attribute.name().to_string(),
            attribute_type: attribute.attribute_type(),
            unit: attribute.unit().map(str::to_string),
            enabled: attribute.enabled(),
            version: attribute.version(),
            modified_at: attribute.modified_at(),
            options: attribute.options().to_vec(),
        }
    }
}

/// Emitted whenever an attribute is created or changed.
///
/// Consumers treat both cases as an upsert of the attribute, so a single
/// event type covers them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeUpdated(pub AttributePayload);

impl Event for AttributeUpdated {
    fn event_type(&self) -> &'static str {
        ATTRIBUTE_UPDATED
    }

    fn partition_key(&self) -> String {
        self.0.attribute_id.to_string()
    }
}
