//! Document store collaborators: repositories, transactions and the
//! in-memory database backing them.
//!
//! Reads observe committed state only. Writes are staged on a [`Transaction`]
//! and become visible together when it commits.

pub mod database;
pub mod document;
pub mod in_memory;
pub mod repository;

use thiserror::Error;
use uuid::Uuid;

pub use database::{InMemoryDatabase, Tables, Transaction, TxManager};
pub use document::{Document, UniqueKey};
pub use in_memory::InMemoryRepository;
pub use repository::{
    AttributeListQuery, AttributeQueries, CategoryListQuery, CategoryQueries, PageResult,
    ProductListQuery, ProductQueries, Repository, SortField, SortOrder,
};

/// Stored aggregate kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Attributes,
    Categories,
    Products,
}

impl Collection {
    /// Singular entity name, as used in messages.
    pub fn entity(self) -> &'static str {
        match self {
            Collection::Attributes => "attribute",
            Collection::Categories => "category",
            Collection::Products => "product",
        }
    }
}

impl core::fmt::Display for Collection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.entity())
    }
}

/// Store operation error.
///
/// These are infrastructure errors (storage, concurrency, cancellation) as
/// opposed to domain errors (validation, invariants).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{collection} not found: {id}")]
    NotFound { collection: Collection, id: Uuid },

    /// Conditioned write lost against a concurrent writer.
    #[error("version conflict on {collection} {id}: expected {expected}, found {actual}")]
    VersionConflict {
        collection: Collection,
        id: Uuid,
        expected: u64,
        actual: u64,
    },

    #[error("duplicate key on {collection}.{index}: {value}")]
    DuplicateKey {
        collection: Collection,
        index: &'static str,
        value: String,
    },

    /// All-or-nothing lookup missed at least one id; `ids` lists every miss in
    /// request order.
    #[error("{collection} not found: {}", join_ids(.ids))]
    MissingIds { collection: Collection, ids: Vec<Uuid> },

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("request cancelled")]
    Cancelled,

    #[error("outbox failure: {0}")]
    Outbox(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn not_found(collection: Collection, id: Uuid) -> Self {
        Self::NotFound { collection, id }
    }

    pub(crate) fn poisoned() -> Self {
        Self::Unavailable("lock poisoned".to_string())
    }
}

fn join_ids(ids: &[Uuid]) -> String {
    ids.iter().map(Uuid::to_string).collect::<Vec<_>>().join(", ")
}
