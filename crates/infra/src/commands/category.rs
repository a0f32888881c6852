use std::collections::HashMap;

use catalog_attributes::Attribute;
use catalog_categories::{AttributeRole, Category, CategoryAttribute, CategoryUpdate, NewCategory};
use catalog_core::{AggregateRoot, AttributeId, CategoryId};

use crate::context::RequestContext;
use crate::store::{Repository, TxManager};

use super::{CommandError, Collaborators, EntityKind, check_version, publish};

/// One attribute assignment as requested by the caller. The slug snapshot is
/// taken from the referenced attribute, not from the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryAttributeInput {
    pub attribute_id: AttributeId,
    pub role: AttributeRole,
    pub required: bool,
    pub sort_order: i32,
    pub filterable: bool,
    pub searchable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCategoryCommand {
    pub id: Option<CategoryId>,
    pub name: String,
    pub enabled: bool,
    pub attributes: Vec<CategoryAttributeInput>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCategoryCommand {
    pub id: CategoryId,
    pub version: u64,
    pub name: String,
    pub enabled: bool,
    pub attributes: Vec<CategoryAttributeInput>,
}

fn referenced_ids(inputs: &[CategoryAttributeInput]) -> Vec<AttributeId> {
    inputs.iter().map(|a| a.attribute_id).collect()
}

/// Build assignments from resolved attributes. `existing` wins for slugs so a
/// snapshot taken at first assignment never changes.
fn assignments(
    inputs: Vec<CategoryAttributeInput>,
    resolved: &[Attribute],
    existing: Option<&Category>,
) -> Vec<CategoryAttribute> {
    let slugs: HashMap<AttributeId, &str> = resolved.iter().map(|a| (a.id_typed(), a.slug())).collect();

    inputs
        .into_iter()
        .map(|input| {
            let slug = existing
                .and_then(|c| c.attribute(input.attribute_id))
                .map(|a| a.slug.clone())
                .or_else(|| slugs.get(&input.attribute_id).map(|s| s.to_string()))
                .unwrap_or_default();

            CategoryAttribute {
                attribute_id: input.attribute_id,
                slug,
                role: input.role,
                required: input.required,
                sort_order: input.sort_order,
                filterable: input.filterable,
                searchable: input.searchable,
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct CreateCategoryHandler<T> {
    deps: Collaborators<T>,
}

impl<T: TxManager> CreateCategoryHandler<T> {
    pub fn new(deps: Collaborators<T>) -> Self {
        Self { deps }
    }

    #[tracing::instrument(
        skip_all,
        fields(component = "create-category-handler", request_id = %ctx.request_id()),
        err
    )]
    pub fn handle(&self, ctx: &RequestContext, cmd: CreateCategoryCommand) -> Result<Category, CommandError> {
        let attributes = self.deps.resolve_attributes(ctx, &referenced_ids(&cmd.attributes))?;

        let category = Category::create(NewCategory {
            id: cmd.id,
            name: cmd.name,
            enabled: cmd.enabled,
            attributes: assignments(cmd.attributes, &attributes, None),
        })
        .map_err(|e| CommandError::invalid(EntityKind::Category, e))?;

        let send = self.deps.tx.with_transaction(ctx, |tx| {
            self.deps.categories.insert(tx, &category)?;
            let event = self
                .deps
                .events
                .category_created(ctx.request_id(), &category, &attributes);
            Ok::<_, CommandError>(self.deps.enqueue(tx, &event)?)
        })?;

        tracing::debug!(category_id = %category.id(), "category created");
        publish(ctx, send);

        Ok(category)
    }
}

#[derive(Debug, Clone)]
pub struct UpdateCategoryHandler<T> {
    deps: Collaborators<T>,
}

impl<T: TxManager> UpdateCategoryHandler<T> {
    pub fn new(deps: Collaborators<T>) -> Self {
        Self { deps }
    }

    #[tracing::instrument(
        skip_all,
        fields(component = "update-category-handler", request_id = %ctx.request_id(), category_id = %cmd.id),
        err
    )]
    pub fn handle(&self, ctx: &RequestContext, cmd: UpdateCategoryCommand) -> Result<Category, CommandError> {
        let mut category = self.deps.categories.find_by_id(ctx, cmd.id)?;
        check_version(EntityKind::Category, cmd.id, cmd.version, category.version())?;

        let attributes = self.deps.resolve_attributes(ctx, &referenced_ids(&cmd.attributes))?;
        let assigned = assignments(cmd.attributes, &attributes, Some(&category));

        category
            .update(CategoryUpdate {
                name: cmd.name,
                enabled: cmd.enabled,
                attributes: assigned,
            })
            .map_err(|e| CommandError::invalid(EntityKind::Category, e))?;

        let (updated, send) = self.deps.tx.with_transaction(ctx, |tx| {
            let updated = self.deps.categories.update(tx, &category)?;
            let event = self
                .deps
                .events
                .category_updated(ctx.request_id(), &updated, &attributes);
            let send = self.deps.enqueue(tx, &event)?;
            Ok::<_, CommandError>((updated, send))
        })?;

        tracing::debug!(category_id = %updated.id(), version = updated.version(), "category updated");
        publish(ctx, send);

        Ok(updated)
    }
}
