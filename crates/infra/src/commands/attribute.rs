use catalog_attributes::{Attribute, AttributeOption, AttributeType, AttributeUpdate, NewAttribute};
use catalog_core::{AggregateRoot, AttributeId};

use crate::context::RequestContext;
use crate::store::{Repository, TxManager};

use super::{CommandError, Collaborators, EntityKind, check_version, publish};

#[derive(Debug, Clone, PartialEq)]
pub struct CreateAttributeCommand {
    /// Caller-supplied id for idempotent replay.
    pub id: Option<AttributeId>,
    pub name: String,
    pub slug: String,
    /// Wire name (`single`, `multiple`, `range`, `boolean`, `text`).
    pub attribute_type: String,
    pub unit: Option<String>,
    pub enabled: bool,
    pub options: Vec<AttributeOption>,
}

/// Slug and type are fixed at creation and cannot be changed here.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateAttributeCommand {
    pub id: AttributeId,
    pub version: u64,
    pub name: String,
    pub unit: Option<String>,
    pub enabled: bool,
    pub options: Vec<AttributeOption>,
}

#[derive(Debug, Clone)]
pub struct CreateAttributeHandler<T> {
    deps: Collaborators<T>,
}

impl<T: TxManager> CreateAttributeHandler<T> {
    pub fn new(deps: Collaborators<T>) -> Self {
        Self { deps }
    }

    #[tracing::instrument(
        skip_all,
        fields(component = "create-attribute-handler", request_id = %ctx.request_id(), slug = %cmd.slug),
        err
    )]
    pub fn handle(&self, ctx: &RequestContext, cmd: CreateAttributeCommand) -> Result<Attribute, CommandError> {
        Attribute::validate_identity(&cmd.name, &cmd.slug)
            .map_err(|e| CommandError::invalid(EntityKind::Attribute, e))?;
        let attribute_type: AttributeType = cmd
            .attribute_type
            .parse()
            .map_err(|e| CommandError::invalid(EntityKind::Attribute, e))?;

        let attribute = Attribute::create(NewAttribute {
            id: cmd.id,
            name: cmd.name,
            slug: cmd.slug,
            attribute_type,
            unit: cmd.unit,
            enabled: cmd.enabled,
            options: cmd.options,
        })
        .map_err(|e| CommandError::invalid(EntityKind::Attribute, e))?;

        let send = self.deps.tx.with_transaction(ctx, |tx| {
            self.deps.attributes.insert(tx, &attribute)?;
            let event = self.deps.events.attribute_updated(ctx.request_id(), &attribute);
            Ok::<_, CommandError>(self.deps.enqueue(tx, &event)?)
        })?;

        tracing::debug!(attribute_id = %attribute.id(), "attribute created");
        publish(ctx, send);

        Ok(attribute)
    }
}

#[derive(Debug, Clone)]
pub struct UpdateAttributeHandler<T> {
    deps: Collaborators<T>,
}

impl<T: TxManager> UpdateAttributeHandler<T> {
    pub fn new(deps: Collaborators<T>) -> Self {
        Self { deps }
    }

    #[tracing::instrument(
        skip_all,
        fields(component = "update-attribute-handler", request_id = %ctx.request_id(), attribute_id = %cmd.id),
        err
    )]
    pub fn handle(&self, ctx: &RequestContext, cmd: UpdateAttributeCommand) -> Result<Attribute, CommandError> {
        let mut attribute = self.deps.attributes.find_by_id(ctx, cmd.id)?;
        check_version(EntityKind::Attribute, cmd.id, cmd.version, attribute.version())?;

        attribute
            .update(AttributeUpdate {
                name: cmd.name,
                unit: cmd.unit,
                enabled: cmd.enabled,
                options: cmd.options,
            })
            .map_err(|e| CommandError::invalid(EntityKind::Attribute, e))?;

        let (updated, send) = self.deps.tx.with_transaction(ctx, |tx| {
            let updated = self.deps.attributes.update(tx, &attribute)?;
            let event = self.deps.events.attribute_updated(ctx.request_id(), &updated);
            let send = self.deps.enqueue(tx, &event)?;
            Ok::<_, CommandError>((updated, send))
        })?;

        tracing::debug!(attribute_id = %updated.id(), version = updated.version(), "attribute updated");
        publish(ctx, send);

        Ok(updated)
    }
}
