//! Attributes domain module.
//!
//! Typed, selectable product characteristics (color, size, screen diagonal, ...)
//! implemented purely as deterministic domain logic (no IO, no storage).

pub mod attribute;

pub use attribute::{
    Attribute, AttributeOption, AttributeParts, AttributeType, AttributeUpdate, NewAttribute,
};
