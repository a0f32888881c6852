//! Products domain module.
//!
//! This crate contains business rules for sellable products, implemented purely
//! as deterministic domain logic (no IO, no HTTP, no storage). A product
//! references its category and attributes by id only; resolving those
//! references is left to the command layer.

pub mod product;

pub use product::{AttributeValue, NewProduct, Product, ProductParts, ProductUpdate, ValueSlot};
