use std::collections::HashMap;

use catalog_attributes::{Attribute, AttributeType};
use catalog_categories::Category;
use catalog_core::{AggregateRoot, AttributeId, CategoryId, ProductId};
use catalog_products::{AttributeValue, NewProduct, Product, ProductUpdate, ValueSlot};

use crate::context::RequestContext;
use crate::store::{Repository, StoreError, TxManager};

use super::{CommandError, Collaborators, EntityKind, check_version, publish};

#[derive(Debug, Clone, PartialEq)]
pub struct CreateProductCommand {
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

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateProductCommand {
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
}

/// Category and attributes a product command refers to.
struct References {
    category: Option<Category>,
    attributes: Vec<Attribute>,
}

impl<T: TxManager> Collaborators<T> {
    fn resolve_product_references(
        &self,
        ctx: &RequestContext,
        category_id: Option<CategoryId>,
        values: &[AttributeValue],
    ) -> Result<References, CommandError> {
        let category = match category_id {
            Some(id) => match self.categories.find_by_id(ctx, id) {
                Ok(category) => Some(category),
                Err(StoreError::NotFound { .. }) => return Err(CommandError::CategoryNotFound(id)),
                Err(err) => return Err(err.into()),
            },
            None => None,
        };

        let ids: Vec<AttributeId> = values.iter().map(|v| v.attribute_id).collect();
        let attributes = self.resolve_attributes(ctx, &ids)?;

        if self.config.enforce_attribute_value_types {
            check_value_types(values, &attributes)?;
        }

        Ok(References { category, attributes })
    }
}

fn expected_slot(attribute_type: AttributeType) -> ValueSlot {
    match attribute_type {
        AttributeType::Single => ValueSlot::OptionSlug,
        AttributeType::Multiple => ValueSlot::OptionSlugs,
        AttributeType::Range => ValueSlot::Numeric,
        AttributeType::Boolean => ValueSlot::Boolean,
        AttributeType::Text => ValueSlot::Text,
    }
}

/// Each value must fill exactly the slot of its attribute's type, and option
/// slugs must name existing options.
fn check_value_types(values: &[AttributeValue], attributes: &[Attribute]) -> Result<(), CommandError> {
    let by_id: HashMap<AttributeId, &Attribute> = attributes.iter().map(|a| (a.id_typed(), a)).collect();
    let invalid = |detail: String| CommandError::InvalidData {
        kind: EntityKind::Product,
        detail,
    };

    for value in values {
        let Some(attribute) = by_id.get(&value.attribute_id) else {
            continue;
        };

        let expected = expected_slot(attribute.attribute_type());
        if value.populated_slots() != [expected] {
            return Err(invalid(format!(
                "attribute {} expects a {} value",
                attribute.slug(),
                attribute.attribute_type()
            )));
        }

        let selected = value
            .option_slug_value
            .iter()
            .chain(value.option_slug_values.iter());
        for slug in selected {
            if attribute.option(slug).is_none() {
                return Err(invalid(format!(
                    "attribute {} has no option {}",
                    attribute.slug(),
                    slug
                )));
            }
        }
    }

    Ok(())
}

#[derive(Debug, Clone)]
pub struct CreateProductHandler<T> {
    deps: Collaborators<T>,
}

impl<T: TxManager> CreateProductHandler<T> {
    pub fn new(deps: Collaborators<T>) -> Self {
        Self { deps }
    }

    #[tracing::instrument(
        skip_all,
        fields(component = "create-product-handler", request_id = %ctx.request_id()),
        err
    )]
    pub fn handle(&self, ctx: &RequestContext, cmd: CreateProductCommand) -> Result<Product, CommandError> {
        let refs = self
            .deps
            .resolve_product_references(ctx, cmd.category_id, &cmd.attributes)?;

        let product = Product::create(NewProduct {
            id: cmd.id,
            name: cmd.name,
            description: cmd.description,
            price: cmd.price,
            quantity: cmd.quantity,
            image_id: cmd.image_id,
            category_id: cmd.category_id,
            enabled: cmd.enabled,
            attributes: cmd.attributes,
        })
        .map_err(|e| CommandError::invalid(EntityKind::Product, e))?;

        let send = self.deps.tx.with_transaction(ctx, |tx| {
            self.deps.products.insert(tx, &product)?;
            let event = self.deps.events.product_created(
                ctx.request_id(),
                &product,
                refs.category.as_ref(),
                &refs.attributes,
            );
            Ok::<_, CommandError>(self.deps.enqueue(tx, &event)?)
        })?;

        tracing::debug!(product_id = %product.id(), "product created");
        publish(ctx, send);

        Ok(product)
    }
}

#[derive(Debug, Clone)]
pub struct UpdateProductHandler<T> {
    deps: Collaborators<T>,
}

impl<T: TxManager> UpdateProductHandler<T> {
    pub fn new(deps: Collaborators<T>) -> Self {
        Self { deps }
    }

    #[tracing::instrument(
        skip_all,
        fields(component = "update-product-handler", request_id = %ctx.request_id(), product_id = %cmd.id),
        err
    )]
    pub fn handle(&self, ctx: &RequestContext, cmd: UpdateProductCommand) -> Result<Product, CommandError> {
        let mut product = self.deps.products.find_by_id(ctx, cmd.id)?;
        check_version(EntityKind::Product, cmd.id, cmd.version, product.version())?;

        let refs = self
            .deps
            .resolve_product_references(ctx, cmd.category_id, &cmd.attributes)?;

        product
            .update(ProductUpdate {
                name: cmd.name,
                description: cmd.description,
                price: cmd.price,
                quantity: cmd.quantity,
                image_id: cmd.image_id,
                category_id: cmd.category_id,
                enabled: cmd.enabled,
                attributes: cmd.attributes,
            })
            .map_err(|e| CommandError::invalid(EntityKind::Product, e))?;

        let (updated, send) = self.deps.tx.with_transaction(ctx, |tx| {
            let updated = self.deps.products.update(tx, &product)?;
            let event = self.deps.events.product_updated(
                ctx.request_id(),
                &updated,
                refs.category.as_ref(),
                &refs.attributes,
            );
            let send = self.deps.enqueue(tx, &event)?;
            Ok::<_, CommandError>((updated, send))
        })?;

        tracing::debug!(product_id = %updated.id(), version = updated.version(), "product updated");
        publish(ctx, send);

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use catalog_categories::{AttributeRole, CategoryAttribute, NewCategory};

    use super::*;
    use crate::commands::ErrorKind;
    use crate::commands::test_support::{Harness, color, harness, harness_with, weight};
    use crate::config::CatalogConfig;

    fn seed_category(h: &Harness, attributes: &[&Attribute]) -> Category {
        let category = Category::create(NewCategory {
            id: None,
            name: "Phones".to_string(),
            enabled: true,
            attributes: attributes
                .iter()
                .enumerate()
                .map(|(i, a)| CategoryAttribute {
                    attribute_id: a.id_typed(),
                    slug: a.slug().to_string(),
                    role: AttributeRole::Variant,
                    required: false,
                    sort_order: i as i32,
                    filterable: true,
                    searchable: true,
                })
                .collect(),
        })
        .unwrap();
        let ctx = RequestContext::new();
        h.db
            .with_transaction(&ctx, |tx| h.deps.categories.insert(tx, &category))
            .unwrap();
        category
    }

    fn create_phone(category_id: Option<CategoryId>, attributes: Vec<AttributeValue>) -> CreateProductCommand {
        CreateProductCommand {
            id: None,
            name: "Phone X".to_string(),
            description: Some("Flagship".to_string()),
            price: 99_900,
            quantity: 5,
            image_id: Some("img-1".to_string()),
            category_id,
            enabled: true,
            attributes,
        }
    }

    #[test]
    fn create_persists_and_emits_enriched_event() {
        let h = harness();
        let color = color();
        let weight = weight();
        h.seed_attribute(&color);
        h.seed_attribute(&weight);
        let category = seed_category(&h, &[&color]);
        let ctx = RequestContext::new();

        let product = CreateProductHandler::new(h.deps.clone())
            .handle(
                &ctx,
                create_phone(
                    Some(category.id_typed()),
                    vec![
                        AttributeValue::for_attribute(color.id_typed()).with_option("red"),
                        AttributeValue::for_attribute(weight.id_typed()).with_numeric(171.0),
                    ],
                ),
            )
            .unwrap();

        assert_eq!(product.version(), 1);
        assert!(h.deps.products.exists(&ctx, product.id_typed()).unwrap());

        let message = h.events.try_recv().unwrap();
        assert_eq!(message.event_type, "catalog.product.created");
        assert_eq!(message.partition_key, product.id_typed().to_string());
        let values = &message.payload["payload"]["attributes"];
        assert_eq!(values[0]["role"], "variant");
        assert_eq!(values[0]["attribute"]["slug"], "color");
        assert_eq!(values[1]["role"], serde_json::Value::Null);
        assert_eq!(values[1]["attribute"]["unit"], "g");
    }

    #[test]
    fn unknown_category_fails_before_any_write() {
        let h = harness();
        let missing = CategoryId::new();

        let err = CreateProductHandler::new(h.deps.clone())
            .handle(
                &RequestContext::new(),
                CreateProductCommand {
                    name: "X".to_string(),
                    price: 10,
                    quantity: 5,
                    ..create_phone(Some(missing), vec![])
                },
            )
            .unwrap_err();

        assert_eq!(err, CommandError::CategoryNotFound(missing));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(h.outbox.records().unwrap().is_empty());
    }

    #[test]
    fn unknown_attribute_is_named() {
        let h = harness();
        let category = seed_category(&h, &[]);
        let unknown = AttributeId::new();

        let err = CreateProductHandler::new(h.deps.clone())
            .handle(
                &RequestContext::new(),
                create_phone(
                    Some(category.id_typed()),
                    vec![AttributeValue::for_attribute(unknown).with_text("x")],
                ),
            )
            .unwrap_err();

        assert_eq!(err, CommandError::AttributeNotFound(unknown));
    }

    #[test]
    fn enabling_without_image_names_the_failing_rule() {
        let h = harness();
        let category = seed_category(&h, &[]);

        let err = CreateProductHandler::new(h.deps.clone())
            .handle(
                &RequestContext::new(),
                CreateProductCommand {
                    image_id: None,
                    ..create_phone(Some(category.id_typed()), vec![])
                },
            )
            .unwrap_err();

        assert_eq!(
            err,
            CommandError::InvalidData {
                kind: EntityKind::Product,
                detail: "cannot enable product: imageID is required".to_string()
            }
        );
    }

    #[test]
    fn mismatched_value_slot_passes_unless_enforced() {
        let color = color();
        let cmd = |category: &Category| {
            create_phone(
                Some(category.id_typed()),
                vec![AttributeValue::for_attribute(color.id_typed()).with_numeric(3.0)],
            )
        };

        let lenient = harness();
        lenient.seed_attribute(&color);
        let category = seed_category(&lenient, &[&color]);
        assert!(
            CreateProductHandler::new(lenient.deps.clone())
                .handle(&RequestContext::new(), cmd(&category))
                .is_ok()
        );

        let strict = harness_with(CatalogConfig {
            enforce_attribute_value_types: true,
            ..CatalogConfig::default()
        });
        strict.seed_attribute(&color);
        let category = seed_category(&strict, &[&color]);
        let err = CreateProductHandler::new(strict.deps.clone())
            .handle(&RequestContext::new(), cmd(&category))
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid product data: attribute color expects a single value");
    }

    #[test]
    fn enforced_types_reject_unknown_option() {
        let h = harness_with(CatalogConfig {
            enforce_attribute_value_types: true,
            ..CatalogConfig::default()
        });
        let color = color();
        h.seed_attribute(&color);
        let category = seed_category(&h, &[&color]);

        let err = CreateProductHandler::new(h.deps.clone())
            .handle(
                &RequestContext::new(),
                create_phone(
                    Some(category.id_typed()),
                    vec![AttributeValue::for_attribute(color.id_typed()).with_option("green")],
                ),
            )
            .unwrap_err();

        assert_eq!(err.to_string(), "invalid product data: attribute color has no option green");
    }

    #[test]
    fn update_replaces_fields_and_bumps_version() {
        let h = harness();
        let category = seed_category(&h, &[]);
        let ctx = RequestContext::new();
        let product = CreateProductHandler::new(h.deps.clone())
            .handle(&ctx, create_phone(Some(category.id_typed()), vec![]))
            .unwrap();
        h.events.drain();

        let updated = UpdateProductHandler::new(h.deps.clone())
            .handle(
                &ctx,
                UpdateProductCommand {
                    id: product.id_typed(),
                    version: 1,
                    name: "Phone X2".to_string(),
                    description: None,
                    price: 10,
                    quantity: 0,
                    image_id: None,
                    category_id: None,
                    enabled: false,
                    attributes: vec![],
                },
            )
            .unwrap();

        assert_eq!(updated.version(), 2);
        assert_eq!(updated.name(), "Phone X2");
        assert!(!updated.enabled());
        assert_eq!(h.events.try_recv().unwrap().event_type, "catalog.product.updated");
    }

    #[test]
    fn invalid_update_leaves_product_untouched() {
        let h = harness();
        let category = seed_category(&h, &[]);
        let ctx = RequestContext::new();
        let product = CreateProductHandler::new(h.deps.clone())
            .handle(&ctx, create_phone(Some(category.id_typed()), vec![]))
            .unwrap();

        let err = UpdateProductHandler::new(h.deps.clone())
            .handle(
                &ctx,
                UpdateProductCommand {
                    id: product.id_typed(),
                    version: 1,
                    name: String::new(),
                    description: None,
                    price: 10,
                    quantity: 5,
                    image_id: None,
                    category_id: None,
                    enabled: false,
                    attributes: vec![],
                },
            )
            .unwrap_err();

        assert_eq!(
            err,
            CommandError::InvalidData {
                kind: EntityKind::Product,
                detail: "name is required".to_string()
            }
        );
        let stored = h.deps.products.find_by_id(&ctx, product.id_typed()).unwrap();
        assert_eq!(stored, product);
    }
}
