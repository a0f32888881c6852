use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use catalog_core::validation::{LONG_NAME_MAX, require_text};
use catalog_core::{AggregateRoot, AttributeId, CategoryId, DomainResult, INITIAL_VERSION, ValueObject};

/// How a category uses one of its attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeRole {
    /// Buyer-selectable; drives product variants (color, size).
    Variant,
    /// Descriptive only; shown in the product specification.
    Specification,
}

impl AttributeRole {
    pub fn as_str(self) -> &'static str {
        match self {
            AttributeRole::Variant => "variant",
            AttributeRole::Specification => "specification",
        }
    }
}

impl core::fmt::Display for AttributeRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Assignment of an attribute to a category.
///
/// `slug` is a snapshot of the attribute's slug taken when the assignment was
/// made. The category never checks that `attribute_id` exists or that the
/// snapshot is current; command handlers resolve references before calling in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryAttribute {
    pub attribute_id: AttributeId,
    pub slug: String,
    pub role: AttributeRole,
    pub required: bool,
    pub sort_order: i32,
    pub filterable: bool,
    pub searchable: bool,
}

impl ValueObject for CategoryAttribute {}

/// Input of [`Category::create`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    pub id: Option<CategoryId>,
    pub name: String,
    pub enabled: bool,
    pub attributes: Vec<CategoryAttribute>,
}

/// Input of [`Category::update`].
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryUpdate {
    pub name: String,
    pub enabled: bool,
    pub attributes: Vec<CategoryAttribute>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryParts {
    pub id: CategoryId,
    pub version: u64,
    pub name: String,
    pub enabled: bool,
    pub attributes: Vec<CategoryAttribute>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Aggregate root: Category.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    id: CategoryId,
    version: u64,
    name: String,
    enabled: bool,
    attributes: Vec<CategoryAttribute>,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

impl Category {
    pub fn create(input: NewCategory) -> DomainResult<Self> {
        validate_name(&input.name)?;

        let now = Utc::now();
        Ok(Self {
            id: input.id.unwrap_or_default(),
            version: INITIAL_VERSION,
            name: input.name,
            enabled: input.enabled,
            attributes: input.attributes,
            created_at: now,
            modified_at: now,
        })
    }

    /// Rebuild from trusted storage. No validation is performed.
    pub fn reconstruct(parts: CategoryParts) -> Self {
        Self {
            id: parts.id,
            version: parts.version,
            name: parts.name,
            enabled: parts.enabled,
            attributes: parts.attributes,
            created_at: parts.created_at,
            modified_at: parts.modified_at,
        }
    }

    pub fn to_parts(&self) -> CategoryParts {
        CategoryParts {
            id: self.id,
            version: self.version,
            name: self.name.clone(),
            enabled: self.enabled,
            attributes: self.attributes.clone(),
            created_at: self.created_at,
            modified_at: self.modified_at,
        }
    }

    pub fn update(&mut self, update: CategoryUpdate) -> DomainResult<()> {
        validate_name(&update.name)?;

        self.name = update.name;
        self.enabled = update.enabled;
        self.attributes = update.attributes;
        self.touch();

        Ok(())
    }

    pub fn change_name(&mut self, name: impl Into<String>) -> DomainResult<()> {
        let name = name.into();
        validate_name(&name)?;

        self.name = name;
        self.touch();
        Ok(())
    }

    /// Unconditional; categories have no enablement preconditions.
    pub fn enable(&mut self) {
        self.enabled = true;
        self.touch();
    }

    pub fn disable(&mut self) {
        self.enabled = false;
        self.touch();
    }

    /// Bump the version by one.
    ///
    /// Only for paths that persist outside the conditioned repository write;
    /// the store bumps the version itself on a regular update.
    pub fn increment_version(&mut self) {
        self.version += 1;
    }

    pub fn id_typed(&self) -> CategoryId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn attributes(&self) -> &[CategoryAttribute] {
        &self.attributes
    }

    pub fn attribute(&self, attribute_id: AttributeId) -> Option<&CategoryAttribute> {
        self.attributes.iter().find(|a| a.attribute_id == attribute_id)
    }

    pub fn attribute_ids(&self) -> Vec<AttributeId> {
        self.attributes.iter().map(|a| a.attribute_id).collect()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }

    fn touch(&mut self) {
        self.modified_at = Utc::now();
    }
}

impl AggregateRoot for Category {
    type Id = CategoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

fn validate_name(name: &str) -> DomainResult<()> {
    require_text("name", name, LONG_NAME_MAX)
}
