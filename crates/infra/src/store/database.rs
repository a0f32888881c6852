use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use catalog_attributes::Attribute;
use catalog_categories::Category;
use catalog_core::{AttributeId, CategoryId, ProductId};
use catalog_products::Product;

use crate::context::RequestContext;
use crate::outbox::OutboxTable;

use super::StoreError;

/// Committed state of the in-memory database.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub(crate) attributes: HashMap<AttributeId, Attribute>,
    pub(crate) categories: HashMap<CategoryId, Category>,
    pub(crate) products: HashMap<ProductId, Product>,
    pub(crate) outbox: OutboxTable,
}

type StagedWrite = Box<dyn FnOnce(&mut Tables) -> Result<(), StoreError> + Send>;

/// In-memory document database.
///
/// Intended for tests/dev. A commit copies the tables, applies every staged
/// write to the copy and swaps it in, so a failing write leaves nothing behind.
#[derive(Debug, Default)]
pub struct InMemoryDatabase {
    tables: RwLock<Tables>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against committed state.
    pub fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> Result<R, StoreError> {
        let tables = self.tables.read().map_err(|_| StoreError::poisoned())?;
        Ok(f(&tables))
    }

    /// Mutate committed state directly, outside any transaction.
    ///
    /// Only for bookkeeping that is not part of a command (outbox delivery
    /// status).
    pub(crate) fn write<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> Result<R, StoreError> {
        let mut tables = self.tables.write().map_err(|_| StoreError::poisoned())?;
        Ok(f(&mut tables))
    }

    pub fn begin<'a>(&'a self, ctx: &'a RequestContext) -> Transaction<'a> {
        Transaction {
            db: self,
            ctx,
            writes: Vec::new(),
        }
    }
}

/// Unit of work over an [`InMemoryDatabase`].
///
/// Writes are staged and checked again at commit. Dropping a transaction
/// without committing discards them.
pub struct Transaction<'a> {
    db: &'a InMemoryDatabase,
    ctx: &'a RequestContext,
    writes: Vec<StagedWrite>,
}

impl<'a> Transaction<'a> {
    pub fn context(&self) -> &RequestContext {
        self.ctx
    }

    pub fn database(&self) -> &InMemoryDatabase {
        self.db
    }

    pub fn stage<F>(&mut self, write: F)
    where
        F: FnOnce(&mut Tables) -> Result<(), StoreError> + Send + 'static,
    {
        self.writes.push(Box::new(write));
    }

    pub fn staged_writes(&self) -> usize {
        self.writes.len()
    }

    pub fn commit(self) -> Result<(), StoreError> {
        let mut tables = self.db.tables.write().map_err(|_| StoreError::poisoned())?;

        // Checked under the lock: once this passes the commit cannot be cancelled.
        self.ctx.ensure_active()?;

        let mut next = tables.clone();
        for write in self.writes {
            write(&mut next)?;
        }
        *tables = next;

        Ok(())
    }
}

impl core::fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Transaction")
            .field("request_id", &self.ctx.request_id())
            .field("staged_writes", &self.writes.len())
            .finish()
    }
}

/// Runs a closure atomically.
///
/// The closure's error is the rollback signal; the statically typed result is
/// returned only when the commit succeeded.
pub trait TxManager: Send + Sync {
    fn with_transaction<T, E, F>(&self, ctx: &RequestContext, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<T, E>,
        E: From<StoreError>;
}

impl TxManager for InMemoryDatabase {
    fn with_transaction<T, E, F>(&self, ctx: &RequestContext, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<T, E>,
        E: From<StoreError>,
    {
        ctx.ensure_active()?;

        let mut tx = self.begin(ctx);
        let value = match f(&mut tx) {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(
                    request_id = %ctx.request_id(),
                    staged_writes = tx.staged_writes(),
                    "transaction rolled back"
                );
                return Err(err);
            }
        };

        let staged = tx.staged_writes();
        if let Err(err) = tx.commit() {
            tracing::debug!(request_id = %ctx.request_id(), error = %err, "commit failed");
            return Err(err.into());
        }

        tracing::trace!(request_id = %ctx.request_id(), staged_writes = staged, "transaction committed");
        Ok(value)
    }
}

impl<M> TxManager for Arc<M>
where
    M: TxManager,
{
    fn with_transaction<T, E, F>(&self, ctx: &RequestContext, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<T, E>,
        E: From<StoreError>,
    {
        (**self).with_transaction(ctx, f)
    }
}
