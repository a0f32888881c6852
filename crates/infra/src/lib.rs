//! Infrastructure layer: document store, transactions, outbox, configuration
//! and the command handlers that tie them to the catalog aggregates.

pub mod commands;
pub mod config;
pub mod context;
pub mod outbox;
pub mod store;


pub use commands::{CommandError, Collaborators, EntityKind, ErrorKind};
pub use config::{CatalogConfig, ConfigError};
pub use context::RequestContext;
pub use outbox::{InMemoryOutbox, Outbox, OutboxError, OutboxMessage, OutboxRecord, OutboxStatus, SendFn};
pub use store::{InMemoryDatabase, StoreError, TxManager};
