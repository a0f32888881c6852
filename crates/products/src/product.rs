use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use catalog_core::validation::{LONG_NAME_MAX, require_text};
use catalog_core::{
    AggregateRoot, AttributeId, CategoryId, DomainError, DomainResult, INITIAL_VERSION, ProductId,
    ValueObject,
};

/// Value slot of an [`AttributeValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueSlot {
    OptionSlug,
    OptionSlugs,
    Numeric,
    Text,
    Boolean,
}

/// A product's value for one attribute.
///
/// Only the slot matching the referenced attribute's type should be filled.
/// The product does not enforce that; see [`AttributeValue::populated_slots`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AttributeValue {
    pub attribute_id: AttributeId,
    /// Selected option slug (single-choice attributes).
    pub option_slug_value: Option<String>,
    /// Selected option slugs (multiple-choice attributes).
    #[serde(default)]
    pub option_slug_values: Vec<String>,
    /// Range attributes.
    pub numeric_value: Option<f64>,
    pub text_value: Option<String>,
    pub boolean_value: Option<bool>,
}

impl ValueObject for AttributeValue {}

impl AttributeValue {
    /// Empty value for `attribute_id`; fill one slot with the `with_*` builders.
    pub fn for_attribute(attribute_id: AttributeId) -> Self {
        Self {
            attribute_id,
            ..Self::default()
        }
    }

    pub fn with_option(mut self, slug: impl Into<String>) -> Self {
        self.option_slug_value = Some(slug.into());
        self
    }

    pub fn with_options<I, S>(mut self, slugs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.option_slug_values = slugs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_numeric(mut self, value: f64) -> Self {
        self.numeric_value = Some(value);
        self
    }

    pub fn with_text(mut self, value: impl Into<String>) -> Self {
        self.text_value = Some(value.into());
        self
    }

    pub fn with_boolean(mut self, value: bool) -> Self {
        self.boolean_value = Some(value);
        self
    }

    /// Slots that carry a value, in declaration order.
    pub fn populated_slots(&self) -> Vec<ValueSlot> {
        let mut slots = Vec::new();
        if self.option_slug_value.is_some() {
            slots.push(ValueSlot::OptionSlug);
        }
        if !self.option_slug_values.is_empty() {
            slots.push(ValueSlot::OptionSlugs);
        }
        if self.numeric_value.is_some() {
            slots.push(ValueSlot::Numeric);
        }
        if self.text_value.is_some() {
            slots.push(ValueSlot::Text);
        }
        if self.boolean_value.is_some() {
            slots.push(ValueSlot::Boolean);
        }
        slots
    }
}

/// Input of [`Product::create`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub id: Option<ProductId>,
    pub name: String,
    pub description: Option<String>,
    /// Minor currency units.
    pub price: i64,
    pub quantity: i32,
    pub image_id: Option<String>,
    pub category_id: Option<CategoryId>,
    pub enabled: bool,
    pub attributes: Vec<AttributeValue>,
}

/// Input of [`Product::update`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProductUpdate {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub quantity: i32,
    pub image_id: Option<String>,
    pub category_id: Option<CategoryId>,
    pub enabled: bool,
    pub attributes: Vec<AttributeValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductParts {
    pub id: ProductId,
    pub version: u64,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub quantity: i32,
    pub image_id: Option<String>,
    pub category_id: Option<CategoryId>,
    pub enabled: bool,
    pub attributes: Vec<AttributeValue>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Aggregate root: Product.
///
/// Invariant: an enabled product has a positive price and quantity, an image
/// and a category.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    id: ProductId,
    version: u64,
    name: String,
    description: Option<String>,
    price: i64,
    quantity: i32,
    image_id: Option<String>,
    category_id: Option<CategoryId>,
    enabled: bool,
    attributes: Vec<AttributeValue>,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

impl Product {
    pub fn create(input: NewProduct) -> DomainResult<Self> {
        validate_base(&input.name, input.price, input.quantity)?;
        validate_enablement(
            input.enabled,
            input.price,
            input.quantity,
            input.image_id.as_deref(),
            input.category_id,
        )?;

        let now = Utc::now();
        Ok(Self {
            id: input.id.unwrap_or_default(),
            version: INITIAL_VERSION,
            name: input.name,
            description: input.description,
            price: input.price,
            quantity: input.quantity,
            image_id: input.image_id,
            category_id: input.category_id,
            enabled: input.enabled,
            attributes: input.attributes,
            created_at: now,
            modified_at: now,
        })
    }

    /// Rebuild from trusted storage. No validation is performed.
    pub fn reconstruct(parts: ProductParts) -> Self {
        Self {
            id: parts.id,
            version: parts.version,
            name: parts.name,
            description: parts.description,
            price: parts.price,
            quantity: parts.quantity,
            image_id: parts.image_id,
            category_id: parts.category_id,
            enabled: parts.enabled,
            attributes: parts.attributes,
            created_at: parts.created_at,
            modified_at: parts.modified_at,
        }
    }

    pub fn to_parts(&self) -> ProductParts {
        ProductParts {
            id: self.id,
            version: self.version,
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            quantity: self.quantity,
            image_id: self.image_id.clone(),
            category_id: self.category_id,
            enabled: self.enabled,
            attributes: self.attributes.clone(),
            created_at: self.created_at,
            modified_at: self.modified_at,
        }
    }

    pub fn update(&mut self, update: ProductUpdate) -> DomainResult<()> {
        validate_base(&update.name, update.price, update.quantity)?;
        validate_enablement(
            update.enabled,
            update.price,
            update.quantity,
            update.image_id.as_deref(),
            update.category_id,
        )?;

        self.name = update.name;
        self.description = update.description;
        self.price = update.price;
        self.quantity = update.quantity;
        self.image_id = update.image_id;
        self.category_id = update.category_id;
        self.enabled = update.enabled;
        self.attributes = update.attributes;
        self.modified_at = Utc::now();

        Ok(())
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn price(&self) -> i64 {
        self.price
    }

    pub fn quantity(&self) -> i32 {
        self.quantity
    }

    pub fn image_id(&self) -> Option<&str> {
        self.image_id.as_deref()
    }

    pub fn category_id(&self) -> Option<CategoryId> {
        self.category_id
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn attributes(&self) -> &[AttributeValue] {
        &self.attributes
    }

    /// Referenced attribute ids, deduplicated, in first-seen order.
    pub fn attribute_ids(&self) -> Vec<AttributeId> {
        let mut ids: Vec<AttributeId> = Vec::with_capacity(self.attributes.len());
        for value in &self.attributes {
            if !ids.contains(&value.attribute_id) {
                ids.push(value.attribute_id);
            }
        }
        ids
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }
}

impl AggregateRoot for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

fn validate_base(name: &str, price: i64, quantity: i32) -> DomainResult<()> {
    require_text("name", name, LONG_NAME_MAX)?;

    if price < 0 {
        return Err(DomainError::validation("price must be positive"));
    }

    if quantity < 0 {
        return Err(DomainError::validation("quantity cannot be negative"));
    }

    Ok(())
}

// Checked in a fixed order so the message names the first failing condition.
fn validate_enablement(
    enabled: bool,
    price: i64,
    quantity: i32,
    image_id: Option<&str>,
    category_id: Option<CategoryId>,
) -> DomainResult<()> {
    if !enabled {
        return Ok(());
    }

    if price <= 0 {
        return Err(DomainError::validation(
            "cannot enable product: price must be greater than 0",
        ));
    }

    if quantity <= 0 {
        return Err(DomainError::validation(
            "cannot enable product: quantity must be greater than 0",
        ));
    }

    if image_id.is_none() {
        return Err(DomainError::validation("cannot enable product: imageID is required"));
    }

    if category_id.is_none() {
        return Err(DomainError::validation(
            "cannot enable product: categoryID is required",
        ));
    }

    Ok(())
}
