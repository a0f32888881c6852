//! Catalog integration events.
//!
//! Events are built once per command from the persisted aggregate plus the
//! referenced attributes/category already loaded by the handler, so consumers
//! never have to look those up again.

pub mod attribute;
pub mod bus;
pub mod category;
pub mod envelope;
pub mod event;
pub mod factory;
pub mod in_memory_bus;
pub mod product;
pub mod snapshot;

pub use attribute::{AttributePayload, AttributeUpdated};
pub use bus::{EventBus, Subscription};
pub use category::{CategoryAttributePayload, CategoryCreated, CategoryPayload, CategoryUpdated};
pub use envelope::{EventEnvelope, EventMetadata};
pub use event::Event;
pub use factory::EventFactory;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use product::{ProductAttributePayload, ProductCreated, ProductPayload, ProductUpdated};
pub use snapshot::AttributeSnapshot;
