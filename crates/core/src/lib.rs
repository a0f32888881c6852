//! `catalog-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns)
//! shared by the attribute, category and product aggregates.

pub mod aggregate;
pub mod error;
pub mod id;
pub mod validation;
pub mod value_object;

pub use aggregate::{AggregateRoot, ExpectedVersion, INITIAL_VERSION};
pub use error::{DomainError, DomainResult};
pub use id::{AttributeId, CategoryId, ProductId};
pub use value_object::ValueObject;
