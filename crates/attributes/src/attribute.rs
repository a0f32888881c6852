use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use catalog_core::validation::{
    ATTRIBUTE_NAME_MAX, require_non_negative, require_slug, require_text,
};
use catalog_core::{AggregateRoot, AttributeId, DomainError, DomainResult, INITIAL_VERSION, ValueObject};

/// Kind of value an attribute carries. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    /// Exactly one option may be selected.
    Single,
    /// Any number of options may be selected.
    Multiple,
    /// Numeric value (e.g. weight, diagonal).
    Range,
    Boolean,
    /// Free text.
    Text,
}

impl AttributeType {
    pub fn as_str(self) -> &'static str {
        match self {
            AttributeType::Single => "single",
            AttributeType::Multiple => "multiple",
            AttributeType::Range => "range",
            AttributeType::Boolean => "boolean",
            AttributeType::Text => "text",
        }
    }
}

impl core::fmt::Display for AttributeType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for AttributeType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(AttributeType::Single),
            "multiple" => Ok(AttributeType::Multiple),
            "range" => Ok(AttributeType::Range),
            "boolean" => Ok(AttributeType::Boolean),
            "text" => Ok(AttributeType::Text),
            _ => Err(DomainError::validation("invalid attribute type")),
        }
    }
}

/// Selectable option owned by an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeOption {
    pub name: String,
    /// Unique within the owning attribute.
    pub slug: String,
    pub color_code: Option<String>,
    pub sort_order: i32,
}

impl ValueObject for AttributeOption {}

impl AttributeOption {
    pub fn new(name: impl Into<String>, slug: impl Into<String>, sort_order: i32) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            color_code: None,
            sort_order,
        }
    }

    pub fn with_color_code(mut self, color_code: impl Into<String>) -> Self {
        self.color_code = Some(color_code.into());
        self
    }
}

/// Input of [`Attribute::create`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttribute {
    /// Caller-supplied identifier (idempotent replay); generated when `None`.
    pub id: Option<AttributeId>,
    pub name: String,
    pub slug: String,
    pub attribute_type: AttributeType,
    pub unit: Option<String>,
    pub enabled: bool,
    pub options: Vec<AttributeOption>,
}

/// Input of [`Attribute::update`].
///
/// Slug and type are absent on purpose: they cannot change after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeUpdate {
    pub name: String,
    pub unit: Option<String>,
    pub enabled: bool,
    pub options: Vec<AttributeOption>,
}

/// Every field of an [`Attribute`], as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeParts {
    pub id: AttributeId,
    pub version: u64,
    pub name: String,
    pub slug: String,
    pub attribute_type: AttributeType,
    pub unit: Option<String>,
    pub enabled: bool,
    pub options: Vec<AttributeOption>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Aggregate root: Attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    id: AttributeId,
    version: u64,
    name: String,
    slug: String,
    attribute_type: AttributeType,
    unit: Option<String>,
    enabled: bool,
    options: Vec<AttributeOption>,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

impl Attribute {
    /// Validating factory. The new attribute starts at version 1.
    pub fn create(input: NewAttribute) -> DomainResult<Self> {
        Self::validate_identity(&input.name, &input.slug)?;
        validate_options(&input.options)?;

        let now = Utc::now();
        Ok(Self {
            id: input.id.unwrap_or_default(),
            version: INITIAL_VERSION,
            name: input.name,
            slug: input.slug,
            attribute_type: input.attribute_type,
            unit: input.unit,
            enabled: input.enabled,
            options: input.options,
            created_at: now,
            modified_at: now,
        })
    }

    /// Name and slug rules, checked ahead of the type and the options.
    pub fn validate_identity(name: &str, slug: &str) -> DomainResult<()> {
        validate_name(name)?;
        require_slug("slug", slug)
    }

    /// Rebuild from trusted storage. No validation is performed.
    pub fn reconstruct(parts: AttributeParts) -> Self {
        Self {
            id: parts.id,
            version: parts.version,
            name: parts.name,
            slug: parts.slug,
            attribute_type: parts.attribute_type,
            unit: parts.unit,
            enabled: parts.enabled,
            options: parts.options,
            created_at: parts.created_at,
            modified_at: parts.modified_at,
        }
    }

    pub fn to_parts(&self) -> AttributeParts {
        AttributeParts {
            id: self.id,
            version: self.version,
            name: self.name.clone(),
            slug: self.slug.clone(),
            attribute_type: self.attribute_type,
            unit: self.unit.clone(),
            enabled: self.enabled,
            options: self.options.clone(),
            created_at: self.created_at,
            modified_at: self.modified_at,
        }
    }

    /// Replace the mutable data. Nothing changes unless every rule passes.
    pub fn update(&mut self, update: AttributeUpdate) -> DomainResult<()> {
        validate_name(&update.name)?;
        validate_options(&update.options)?;

        self.name = update.name;
        self.unit = update.unit;
        self.enabled = update.enabled;
        self.options = update.options;
        self.modified_at = Utc::now();

        Ok(())
    }

    pub fn id_typed(&self) -> AttributeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn attribute_type(&self) -> AttributeType {
        self.attribute_type
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn options(&self) -> &[AttributeOption] {
        &self.options
    }

    pub fn option(&self, slug: &str) -> Option<&AttributeOption> {
        self.options.iter().find(|o| o.slug == slug)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }
}

impl AggregateRoot for Attribute {
    type Id = AttributeId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

fn validate_name(name: &str) -> DomainResult<()> {
    require_text("name", name, ATTRIBUTE_NAME_MAX)
}

fn validate_options(options: &[AttributeOption]) -> DomainResult<()> {
    let mut seen = HashSet::with_capacity(options.len());

    for option in options {
        require_text("option name", &option.name, ATTRIBUTE_NAME_MAX)?;
        require_slug("option slug", &option.slug)?;
        if !seen.insert(option.slug.as_str()) {
            return Err(DomainError::validation(format!(
                "duplicate option slug: {}",
                option.slug
            )));
        }
        require_non_negative("option sortOrder", i64::from(option.sort_order))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color_options() -> Vec<AttributeOption> {
        vec![
            AttributeOption::new("Red", "red", 1).with_color_code("#FF0000"),
            AttributeOption::new("Blue", "blue", 2).with_color_code("#0000FF"),
        ]
    }

    fn new_color() -> NewAttribute {
        NewAttribute {
            id: None,
            name: "Color".to_string(),
            slug: "color".to_string(),
            attribute_type: AttributeType::Single,
            unit: None,
            enabled: true,
            options: color_options(),
        }
    }

    fn update_of(attribute: &Attribute) -> AttributeUpdate {
        AttributeUpdate {
            name: attribute.name().to_string(),
            unit: attribute.unit().map(str::to_string),
            enabled: attribute.enabled(),
            options: attribute.options().to_vec(),
        }
    }

    #[test]
    fn create_assigns_id_and_initial_version() {
        let attribute = Attribute::create(new_color()).unwrap();

        assert_eq!(attribute.version(), 1);
        assert_eq!(attribute.name(), "Color");
        assert_eq!(attribute.slug(), "color");
        assert_eq!(attribute.attribute_type(), AttributeType::Single);
        assert_eq!(attribute.options().len(), 2);
        assert!(attribute.enabled());
        assert_eq!(attribute.created_at(), attribute.modified_at());
    }

    #[test]
    fn create_keeps_supplied_id() {
        let id = AttributeId::new();
        let attribute = Attribute::create(NewAttribute {
            id: Some(id),
            ..new_color()
        })
        .unwrap();

        assert_eq!(attribute.id_typed(), id);
    }

    #[test]
    fn create_rejects_uppercase_slug() {
        let err = Attribute::create(NewAttribute {
            name: "Test".to_string(),
            slug: "Invalid-Slug".to_string(),
            enabled: false,
            options: vec![],
            ..new_color()
        })
        .unwrap_err();

        match err {
            DomainError::Validation(msg) => {
                assert!(msg.contains("slug must contain only lowercase"), "{msg}")
            }
            other => panic!("Expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn create_rejects_empty_and_long_names() {
        let err = Attribute::create(NewAttribute {
            name: String::new(),
            ..new_color()
        })
        .unwrap_err();
        assert_eq!(err.detail(), "name is required");

        let err = Attribute::create(NewAttribute {
            name: "x".repeat(101),
            ..new_color()
        })
        .unwrap_err();
        assert_eq!(err.detail(), "name is too long (max 100 characters)");
    }

    #[test]
    fn create_rejects_duplicate_option_slug() {
        let err = Attribute::create(NewAttribute {
            options: vec![
                AttributeOption::new("Red", "red", 1),
                AttributeOption::new("Crimson", "red", 2),
            ],
            ..new_color()
        })
        .unwrap_err();

        assert_eq!(err.detail(), "duplicate option slug: red");
    }

    #[test]
    fn create_rejects_negative_sort_order() {
        let err = Attribute::create(NewAttribute {
            options: vec![AttributeOption::new("Red", "red", -1)],
            ..new_color()
        })
        .unwrap_err();

        assert_eq!(err.detail(), "option sortOrder cannot be negative");
    }

    #[test]
    fn create_rejects_malformed_option_slug() {
        let err = Attribute::create(NewAttribute {
            options: vec![AttributeOption::new("Dark Red", "dark_red", 0)],
            ..new_color()
        })
        .unwrap_err();

        assert_eq!(
            err.detail(),
            "option slug must contain only lowercase letters, numbers, and hyphens"
        );
    }

    #[test]
    fn update_replaces_mutable_fields() {
        let mut attribute = Attribute::create(new_color()).unwrap();
        let before = attribute.modified_at();

        attribute
            .update(AttributeUpdate {
                name: "Colour".to_string(),
                unit: Some("hex".to_string()),
                enabled: false,
                options: vec![AttributeOption::new("Green", "green", 0)],
            })
            .unwrap();

        assert_eq!(attribute.name(), "Colour");
        assert_eq!(attribute.unit(), Some("hex"));
        assert!(!attribute.enabled());
        assert_eq!(attribute.options().len(), 1);
        assert!(attribute.option("green").is_some());
        assert!(attribute.modified_at() >= before);
        assert_eq!(attribute.version(), 1, "domain never bumps the version");
    }

    #[test]
    fn rejected_update_leaves_attribute_untouched() {
        let mut attribute = Attribute::create(new_color()).unwrap();
        let snapshot = attribute.clone();

        let err = attribute
            .update(AttributeUpdate {
                options: vec![
                    AttributeOption::new("Red", "red", 1),
                    AttributeOption::new("Also red", "red", 2),
                ],
                ..update_of(&snapshot)
            })
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(attribute, snapshot);
    }

    #[test]
    fn attribute_type_parses_known_names_only() {
        assert_eq!("range".parse::<AttributeType>().unwrap(), AttributeType::Range);
        let err = "color".parse::<AttributeType>().unwrap_err();
        assert_eq!(err.detail(), "invalid attribute type");
    }

    #[test]
    fn reconstruct_round_trips_parts() {
        let attribute = Attribute::create(new_color()).unwrap();
        assert_eq!(Attribute::reconstruct(attribute.to_parts()), attribute);
    }

    #[test]
    fn reconstruct_skips_validation() {
        let mut parts = Attribute::create(new_color()).unwrap().to_parts();
        parts.slug = "Not A Slug".to_string();
        parts.version = 7;

        let attribute = Attribute::reconstruct(parts);
        assert_eq!(attribute.slug(), "Not A Slug");
        assert_eq!(attribute.version(), 7);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn attribute_type() -> impl Strategy<Value = AttributeType> {
            prop_oneof![
                Just(AttributeType::Single),
                Just(AttributeType::Multiple),
                Just(AttributeType::Range),
                Just(AttributeType::Boolean),
                Just(AttributeType::Text),
            ]
        }

        proptest! {
            /// Property: update never changes slug or type, whatever the input.
            #[test]
            fn update_preserves_slug_and_type(
                kind in attribute_type(),
                name in "[A-Za-z0-9 ]{0,120}",
                enabled in any::<bool>(),
            ) {
                let mut attribute = Attribute::create(NewAttribute {
                    attribute_type: kind,
                    ..new_color()
                }).unwrap();

                let _ = attribute.update(AttributeUpdate {
                    name,
                    unit: None,
                    enabled,
                    options: vec![],
                });

                prop_assert_eq!(attribute.slug(), "color");
                prop_assert_eq!(attribute.attribute_type(), kind);
            }

            /// Property: accepted option lists never contain duplicate slugs.
            #[test]
            fn accepted_options_have_unique_slugs(
                slugs in proptest::collection::vec("[a-c]{1,2}", 0..6),
            ) {
                let options: Vec<_> = slugs
                    .iter()
                    .enumerate()
                    .map(|(i, s)| AttributeOption::new(format!("Option {i}"), s.clone(), i as i32))
                    .collect();

                let mut attribute = Attribute::create(new_color()).unwrap();
                let before = attribute.options().to_vec();

                match attribute.update(AttributeUpdate { options, ..update_of(&attribute) }) {
                    Ok(()) => {
                        let unique: HashSet<_> = attribute.options().iter().map(|o| &o.slug).collect();
                        prop_assert_eq!(unique.len(), attribute.options().len());
                    }
                    Err(_) => prop_assert_eq!(attribute.options(), before.as_slice()),
                }
            }
        }
    }
}
