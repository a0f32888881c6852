use thiserror::Error;
use uuid::Uuid;

use catalog_core::{AttributeId, CategoryId, DomainError};

use crate::outbox::OutboxError;
use crate::store::{Collection, StoreError};

/// Aggregate kind a command operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Attribute,
    Category,
    Product,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Attribute => "attribute",
            EntityKind::Category => "category",
            EntityKind::Product => "product",
        }
    }
}

impl core::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Collection> for EntityKind {
    fn from(value: Collection) -> Self {
        match value {
            Collection::Attributes => EntityKind::Attribute,
            Collection::Categories => EntityKind::Category,
            Collection::Products => EntityKind::Product,
        }
    }
}

/// Coarse error classification for callers (HTTP mapping, retries).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller-correctable input; nothing was written.
    Validation,
    /// Target or referenced aggregate absent.
    NotFound,
    /// Stale version or duplicate slug.
    Conflict,
    /// Store/transaction failure, opaque to callers.
    Infrastructure,
}

/// Error returned by every command handler.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("invalid {kind} data: {detail}")]
    InvalidData { kind: EntityKind, detail: String },

    #[error("{kind} not found: {id}")]
    EntityNotFound { kind: EntityKind, id: Uuid },

    #[error("category not found: {0}")]
    CategoryNotFound(CategoryId),

    #[error("attribute not found: {0}")]
    AttributeNotFound(AttributeId),

    #[error("optimistic lock conflict on {kind} {id}")]
    OptimisticLockConflict { kind: EntityKind, id: Uuid },

    #[error("attribute slug already exists: {0}")]
    DuplicateSlug(String),

    #[error("{kind} already exists: {id}")]
    AlreadyExists { kind: EntityKind, id: String },

    #[error("request cancelled")]
    Cancelled,

    #[error("infrastructure failure: {0}")]
    Infrastructure(StoreError),
}

impl CommandError {
    /// Map a domain error raised while building or mutating `kind`.
    pub fn invalid(kind: EntityKind, err: DomainError) -> Self {
        CommandError::InvalidData {
            kind,
            detail: err.detail().to_string(),
        }
    }

    pub fn conflict(kind: EntityKind, id: impl Into<Uuid>) -> Self {
        CommandError::OptimisticLockConflict { kind, id: id.into() }
    }

    pub fn not_found(kind: EntityKind, id: impl Into<Uuid>) -> Self {
        CommandError::EntityNotFound { kind, id: id.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CommandError::InvalidData { .. } => ErrorKind::Validation,
            CommandError::EntityNotFound { .. }
            | CommandError::CategoryNotFound(_)
            | CommandError::AttributeNotFound(_) => ErrorKind::NotFound,
            CommandError::OptimisticLockConflict { .. }
            | CommandError::DuplicateSlug(_)
            | CommandError::AlreadyExists { .. } => ErrorKind::Conflict,
            CommandError::Cancelled | CommandError::Infrastructure(_) => ErrorKind::Infrastructure,
        }
    }
}

impl From<StoreError> for CommandError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound { collection, id } => CommandError::not_found(collection.into(), id),
            StoreError::VersionConflict { collection, id, .. } => {
                CommandError::conflict(collection.into(), id)
            }
            StoreError::DuplicateKey {
                collection: Collection::Attributes,
                index: "slug",
                value,
            } => CommandError::DuplicateSlug(value),
            StoreError::DuplicateKey {
                collection,
                index: "_id",
                value,
            } => CommandError::AlreadyExists {
                kind: collection.into(),
                id: value,
            },
            StoreError::MissingIds {
                collection: Collection::Attributes,
                ref ids,
            } if !ids.is_empty() => CommandError::AttributeNotFound(AttributeId::from_uuid(ids[0])),
            StoreError::MissingIds {
                collection: Collection::Categories,
                ref ids,
            } if !ids.is_empty() => CommandError::CategoryNotFound(CategoryId::from_uuid(ids[0])),
            StoreError::Cancelled => CommandError::Cancelled,
            other => CommandError::Infrastructure(other),
        }
    }
}

impl From<OutboxError> for CommandError {
    fn from(value: OutboxError) -> Self {
        match value {
            OutboxError::Store(err) => err.into(),
            OutboxError::Publish(reason) => CommandError::Infrastructure(StoreError::Outbox(reason)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_index_collision_is_duplicate_slug() {
        let err = CommandError::from(StoreError::DuplicateKey {
            collection: Collection::Attributes,
            index: "slug",
            value: "color".to_string(),
        });

        assert_eq!(err, CommandError::DuplicateSlug("color".to_string()));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn id_collision_is_already_exists() {
        let id = Uuid::now_v7();
        let err = CommandError::from(StoreError::DuplicateKey {
            collection: Collection::Products,
            index: "_id",
            value: id.to_string(),
        });

        assert_eq!(
            err,
            CommandError::AlreadyExists {
                kind: EntityKind::Product,
                id: id.to_string()
            }
        );
    }

    #[test]
    fn version_conflict_is_optimistic_lock_conflict() {
        let id = Uuid::now_v7();
        let err = CommandError::from(StoreError::VersionConflict {
            collection: Collection::Categories,
            id,
            expected: 1,
            actual: 2,
        });

        assert_eq!(err, CommandError::conflict(EntityKind::Category, id));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn missing_ids_name_the_first_miss() {
        let first = Uuid::now_v7();
        let second = Uuid::now_v7();
        let err = CommandError::from(StoreError::MissingIds {
            collection: Collection::Attributes,
            ids: vec![first, second],
        });

        assert_eq!(err, CommandError::AttributeNotFound(AttributeId::from_uuid(first)));
        assert_eq!(err.to_string(), format!("attribute not found: {first}"));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn domain_errors_become_invalid_data() {
        let err = CommandError::invalid(EntityKind::Product, DomainError::validation("name is required"));

        assert_eq!(
            err,
            CommandError::InvalidData {
                kind: EntityKind::Product,
                detail: "name is required".to_string()
            }
        );
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "invalid product data: name is required");
    }

    #[test]
    fn cancellation_and_store_failures_are_infrastructure() {
        assert_eq!(CommandError::from(StoreError::Cancelled), CommandError::Cancelled);

        let err = CommandError::from(StoreError::Unavailable("lock poisoned".to_string()));
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
    }
}
