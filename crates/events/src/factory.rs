//! Translation from persisted aggregates to outgoing events.

use std::collections::HashMap;

use uuid::Uuid;

use catalog_attributes::Attribute;
use catalog_categories::Category;
use catalog_core::AttributeId;
use catalog_products::Product;

use crate::attribute::{AttributePayload, AttributeUpdated};
use crate::category::{CategoryAttributePayload, CategoryCreated, CategoryPayload, CategoryUpdated};
use crate::envelope::EventEnvelope;
use crate::product::{ProductAttributePayload, ProductCreated, ProductPayload, ProductUpdated};
use crate::snapshot::AttributeSnapshot;

/// Builds self-contained catalog events.
///
/// Attribute and category snapshots are copied from whatever the caller passes
/// in; the factory performs no lookups. Events are therefore frozen at command
/// time and later edits to a referenced aggregate do not reach them.
#[derive(Debug, Clone)]
pub struct EventFactory {
    source: String,
}

impl EventFactory {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn attribute_updated(
        &self,
        request_id: Uuid,
        attribute: &Attribute,
    ) -> EventEnvelope<AttributeUpdated> {
        EventEnvelope::new(
            self.source.clone(),
            request_id,
            AttributeUpdated(AttributePayload::from(attribute)),
        )
    }

    pub fn category_created(
        &self,
        request_id: Uuid,
        category: &Category,
        attributes: &[Attribute],
    ) -> EventEnvelope<CategoryCreated> {
        EventEnvelope::new(
            self.source.clone(),
            request_id,
            CategoryCreated(category_payload(category, attributes)),
        )
    }

    pub fn category_updated(
        &self,
        request_id: Uuid,
        category: &Category,
        attributes: &[Attribute],
    ) -> EventEnvelope<CategoryUpdated> {
        EventEnvelope::new(
            self.source.clone(),
            request_id,
            CategoryUpdated(category_payload(category, attributes)),
        )
    }

    pub fn product_created(
        &self,
        request_id: Uuid,
        product: &Product,
        category: Option<&Category>,
        attributes: &[Attribute],
    ) -> EventEnvelope<ProductCreated> {
        EventEnvelope::new(
            self.source.clone(),
            request_id,
            ProductCreated(product_payload(product, category, attributes)),
        )
    }

    pub fn product_updated(
        &self,
        request_id: Uuid,
        product: &Product,
        category: Option<&Category>,
        attributes: &[Attribute],
    ) -> EventEnvelope<ProductUpdated> {
        EventEnvelope::new(
            self.source.clone(),
            request_id,
            ProductUpdated(product_payload(product, category, attributes)),
        )
    }
}

fn index(attributes: &[Attribute]) -> HashMap<AttributeId, &Attribute> {
    attributes.iter().map(|a| (a.id_typed(), a)).collect()
}

fn category_payload(category: &Category, attributes: &[Attribute]) -> CategoryPayload {
    let by_id = index(attributes);

    let assignments = category
        .attributes()
        .iter()
        .map(|assignment| {
            let snapshot = by_id
                .get(&assignment.attribute_id)
                .map(|a| AttributeSnapshot::from(*a));
            CategoryAttributePayload::new(assignment, snapshot)
        })
        .collect();

    CategoryPayload::new(category, assignments)
}

fn product_payload(
    product: &Product,
    category: Option<&Category>,
    attributes: &[Attribute],
) -> ProductPayload {
    let by_id = index(attributes);

    let values = product
        .attributes()
        .iter()
        .map(|value| {
            let snapshot = by_id
                .get(&value.attribute_id)
                .map(|a| AttributeSnapshot::from(*a));
            let payload = ProductAttributePayload::new(value, snapshot);

            match category.and_then(|c| c.attribute(value.attribute_id)) {
                Some(assignment) => payload.with_category_role(assignment.role, assignment.sort_order),
                None => payload,
            }
        })
        .collect();

    ProductPayload::new(product, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use catalog_attributes::{AttributeOption, AttributeType, AttributeUpdate, NewAttribute};
    use catalog_categories::{AttributeRole, CategoryAttribute, NewCategory};
    use catalog_products::{AttributeValue, NewProduct};

    fn color() -> Attribute {
        Attribute::create(NewAttribute {
            id: None,
            name: "Color".to_string(),
            slug: "color".to_string(),
            attribute_type: AttributeType::Single,
            unit: None,
            enabled: true,
            options: vec![AttributeOption::new("Red", "red", 0)],
        })
        .unwrap()
    }

    fn weight() -> Attribute {
        Attribute::create(NewAttribute {
            id: None,
            name: "Weight".to_string(),
            slug: "weight".to_string(),
            attribute_type: AttributeType::Range,
            unit: Some("g".to_string()),
            enabled: true,
            options: vec![],
        })
        .unwrap()
    }

    fn category_with(attribute: &Attribute, role: AttributeRole, sort_order: i32) -> Category {
        Category::create(NewCategory {
            id: None,
            name: "Phones".to_string(),
            enabled: true,
            attributes: vec![CategoryAttribute {
                attribute_id: attribute.id_typed(),
                slug: attribute.slug().to_string(),
                role,
                required: true,
                sort_order,
                filterable: true,
                searchable: false,
            }],
        })
        .unwrap()
    }

    fn product_with(category: &Category, values: Vec<AttributeValue>) -> Product {
        Product::create(NewProduct {
            id: None,
            name: "Phone X".to_string(),
            description: None,
            price: 100,
            quantity: 1,
            image_id: Some("img".to_string()),
            category_id: Some(category.id_typed()),
            enabled: true,
            attributes: values,
        })
        .unwrap()
    }

    #[test]
    fn attribute_event_is_keyed_by_attribute_id() {
        let factory = EventFactory::new("catalog-test");
        let attribute = color();
        let request_id = Uuid::now_v7();

        let event = factory.attribute_updated(request_id, &attribute);

        assert_eq!(event.event_type(), "catalog.attribute.updated");
        assert_eq!(event.metadata().source, "catalog-test");
        assert_eq!(event.metadata().request_id, request_id);
        assert_eq!(event.partition_key(), attribute.id_typed().to_string());
        assert_eq!(event.payload().0.version, 1);
    }

    #[test]
    fn category_event_denormalises_attributes() {
        let factory = EventFactory::new("catalog-test");
        let attribute = color();
        let category = category_with(&attribute, AttributeRole::Variant, 3);

        let event = factory.category_created(Uuid::now_v7(), &category, &[attribute.clone()]);
        let assignment = &event.payload().0.attributes[0];

        assert_eq!(event.payload().event_type(), "catalog.category.created");
        assert_eq!(assignment.role, AttributeRole::Variant);
        assert_eq!(assignment.sort_order, 3);
        let snapshot = assignment.attribute.as_ref().unwrap();
        assert_eq!(snapshot.name, "Color");
        assert_eq!(snapshot.slug, "color");
        assert_eq!(snapshot.options.len(), 1);
    }

    #[test]
    fn unresolved_assignment_has_no_snapshot() {
        let factory = EventFactory::new("catalog-test");
        let category = category_with(&color(), AttributeRole::Specification, 0);

        let event = factory.category_updated(Uuid::now_v7(), &category, &[]);

        assert_eq!(event.event_type(), "catalog.category.updated");
        assert!(event.payload().0.attributes[0].attribute.is_none());
    }

    #[test]
    fn product_event_carries_category_role_for_assigned_attributes() {
        let factory = EventFactory::new("catalog-test");
        let color = color();
        let weight = weight();
        let category = category_with(&color, AttributeRole::Variant, 2);
        let product = product_with(
            &category,
            vec![
                AttributeValue::for_attribute(color.id_typed()).with_option("red"),
                AttributeValue::for_attribute(weight.id_typed()).with_numeric(171.0),
            ],
        );

        let event = factory.product_created(
            Uuid::now_v7(),
            &product,
            Some(&category),
            &[color.clone(), weight.clone()],
        );
        let values = &event.payload().0.attributes;

        assert_eq!(values[0].role, Some(AttributeRole::Variant));
        assert_eq!(values[0].sort_order, Some(2));
        assert_eq!(values[0].option_slug_value.as_deref(), Some("red"));
        assert_eq!(values[1].role, None);
        assert_eq!(values[1].attribute.as_ref().unwrap().unit.as_deref(), Some("g"));
        assert_eq!(event.partition_key(), product.id_typed().to_string());
    }

    #[test]
    fn emitted_events_are_not_affected_by_later_edits() {
        let factory = EventFactory::new("catalog-test");
        let mut attribute = color();
        let category = category_with(&attribute, AttributeRole::Variant, 0);

        let event = factory.category_created(Uuid::now_v7(), &category, &[attribute.clone()]);

        attribute
            .update(AttributeUpdate {
                name: "Colour".to_string(),
                unit: None,
                enabled: true,
                options: vec![],
            })
            .unwrap();

        let snapshot = event.payload().0.attributes[0].attribute.as_ref().unwrap();
        assert_eq!(snapshot.name, "Color");
        assert_eq!(snapshot.options.len(), 1);
    }

    #[test]
    fn envelope_serializes_metadata_and_payload() {
        let factory = EventFactory::new("catalog-test");
        let event = factory.attribute_updated(Uuid::now_v7(), &color());

        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["metadata"]["event_type"], "catalog.attribute.updated");
        assert_eq!(json["payload"]["type"], "single");
        assert_eq!(json["payload"]["slug"], "color");
        assert_eq!(json["payload"]["options"][0]["slug"], "red");
    }

    #[test]
    fn every_event_gets_a_fresh_id() {
        let factory = EventFactory::new("catalog-test");
        let attribute = color();

        let first = factory.attribute_updated(Uuid::now_v7(), &attribute);
        let second = factory.attribute_updated(Uuid::now_v7(), &attribute);

        assert_ne!(first.event_id(), second.event_id());
        assert_eq!(first.payload(), second.payload());
    }
}
