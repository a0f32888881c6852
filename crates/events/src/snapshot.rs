//! Denormalised copies of referenced aggregates.

use serde::{Deserialize, Serialize};

use catalog_attributes::{Attribute, AttributeOption, AttributeType};
use catalog_core::AttributeId;

/// Attribute state as it was when the event was built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSnapshot {
    pub attribute_id: AttributeId,
    pub name: String,
    pub slug: String,
    #[serde(rename = "type")]
    pub attribute_type: AttributeType,
    pub unit: Option<String>,
    pub options: Vec<AttributeOption>,
}

impl From<&Attribute> for AttributeSnapshot {
    fn from(attribute: &Attribute) -> Self {
        Self {
            attribute_id: attribute.id_typed(),
            name: attribute.name().to_string(),
            slug: attribute.slug().to_string(),
            attribute_type: attribute.attribute_type(),
            unit: attribute.unit().map(str::to_string),
            options: attribute.options().to_vec(),
        }
    }
}
