//! Command handlers (Create/Update per aggregate).
//!
//! Every handler follows the same pipeline:
//!
//! ```text
//! Command
//!   ↓
//! 1. Load target (update) and fail fast on a stale version
//!   ↓
//! 2. Resolve referenced category/attributes (all-or-nothing)
//!   ↓
//! 3. Build or mutate the aggregate (self-validating)
//!   ↓
//! 4. Transaction: conditioned insert/update + event → outbox row
//!   ↓
//! 5. Best-effort send of the outbox row (failure logged, not returned)
//! ```
//!
//! Steps 1-3 never open a transaction. The version check in step 1 is only a
//! shortcut; the conditioned write in step 4 decides.

pub mod attribute;
pub mod category;
pub mod error;
pub mod product;

use std::sync::Arc;

use catalog_attributes::Attribute;
use catalog_categories::Category;
use catalog_core::{AttributeId, ExpectedVersion};
use catalog_events::{Event, EventBus, EventEnvelope, EventFactory};
use catalog_products::Product;
use uuid::Uuid;

use crate::config::CatalogConfig;
use crate::context::RequestContext;
use crate::outbox::{InMemoryOutbox, Outbox, OutboxMessage, SendFn};
use crate::store::{InMemoryDatabase, InMemoryRepository, Repository, StoreError, Transaction, TxManager};

pub use attribute::{
    CreateAttributeCommand, CreateAttributeHandler, UpdateAttributeCommand, UpdateAttributeHandler,
};
pub use category::{
    CategoryAttributeInput, CreateCategoryCommand, CreateCategoryHandler, UpdateCategoryCommand,
    UpdateCategoryHandler,
};
pub use error::{CommandError, EntityKind, ErrorKind};
pub use product::{CreateProductCommand, CreateProductHandler, UpdateProductCommand, UpdateProductHandler};

/// Everything a handler talks to.
///
/// Shared by all handlers; cloning is cheap.
pub struct Collaborators<T> {
    pub attributes: Arc<dyn Repository<Attribute>>,
    pub categories: Arc<dyn Repository<Category>>,
    pub products: Arc<dyn Repository<Product>>,
    pub outbox: Arc<dyn Outbox>,
    pub tx: Arc<T>,
    pub events: EventFactory,
    pub config: CatalogConfig,
}

impl<T> Clone for Collaborators<T> {
    fn clone(&self) -> Self {
        Self {
            attributes: self.attributes.clone(),
            categories: self.categories.clone(),
            products: self.products.clone(),
            outbox: self.outbox.clone(),
            tx: self.tx.clone(),
            events: self.events.clone(),
            config: self.config.clone(),
        }
    }
}

impl<T> core::fmt::Debug for Collaborators<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Collaborators")
            .field("events", &self.events)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Collaborators<InMemoryDatabase> {
    /// Wire every collaborator to one in-memory database, publishing on `bus`.
    pub fn in_memory<B>(db: Arc<InMemoryDatabase>, bus: Arc<B>, config: CatalogConfig) -> Self
    where
        B: EventBus<OutboxMessage> + 'static,
    {
        Self {
            attributes: Arc::new(InMemoryRepository::<Attribute>::with_config(db.clone(), config.clone())),
            categories: Arc::new(InMemoryRepository::<Category>::with_config(db.clone(), config.clone())),
            products: Arc::new(InMemoryRepository::<Product>::with_config(db.clone(), config.clone())),
            outbox: Arc::new(InMemoryOutbox::new(db.clone(), bus)),
            events: EventFactory::new(config.event_source.clone()),
            tx: db,
            config,
        }
    }
}

impl<T: TxManager> Collaborators<T> {
    /// Resolve every id or fail naming the first unknown one.
    pub(crate) fn resolve_attributes(
        &self,
        ctx: &RequestContext,
        ids: &[AttributeId],
    ) -> Result<Vec<Attribute>, CommandError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.attributes.find_by_ids_or_fail(ctx, ids)?)
    }

    /// Serialize `envelope` and stage it on the outbox.
    pub(crate) fn enqueue<E: Event>(
        &self,
        tx: &mut Transaction<'_>,
        envelope: &EventEnvelope<E>,
    ) -> Result<SendFn, StoreError> {
        let message = OutboxMessage::from_envelope(envelope)?;
        self.outbox.create(tx, message)
    }
}

/// Fast-fail version comparison ahead of the conditioned write.
pub(crate) fn check_version(
    kind: EntityKind,
    id: impl Into<Uuid>,
    expected: u64,
    actual: u64,
) -> Result<(), CommandError> {
    ExpectedVersion(expected)
        .check(actual)
        .map_err(|_| CommandError::conflict(kind, id))
}

/// Deliver once after commit. The write is durable; a failure only delays
/// delivery until the outbox is swept.
pub(crate) fn publish(ctx: &RequestContext, send: SendFn) {
    let event_id = send.event_id();
    if let Err(err) = send.send(ctx) {
        tracing::warn!(event_id = %event_id, error = %err, "failed to publish event");
    }
}
