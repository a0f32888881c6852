//! Value object trait: equality by value, not identity.
//!
//! Value objects are domain objects that have **no identity** - they are defined entirely
//! by their attribute values. Two value objects with the same values are considered equal.

/// Marker trait for value objects.
///
/// In the catalog, the parts owned by an aggregate are value objects: an
/// attribute's options, a category's attribute assignments and a product's
/// attribute values. They have no lifecycle of their own; the owning aggregate
/// replaces them wholesale on update and validates them as a set.
///
/// ## Value Object vs Entity
///
/// - **Value Object**: No identity (two value objects with same values are equal)
/// - **Entity**: Has identity (two entities with same ID are the same entity)
///
/// Example:
/// - `AttributeOption { name: "Red", slug: "red", .. }` is a value object
/// - `Attribute { id: AttributeId(...), .. }` is an aggregate root
///
/// The trait requires:
/// - **Clone**: Value objects are copied into events and snapshots
/// - **PartialEq**: Value objects are compared by their attribute values
/// - **Debug**: Value objects should be debuggable (helpful for logging, testing)
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
