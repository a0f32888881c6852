//! Categories domain module.
//!
//! Categories group products and declare which attributes apply to them and in
//! which role. Referential checks against attributes live in the application
//! layer; this crate only guards the category's own data.

pub mod category;

pub use category::{
    AttributeRole, Category, CategoryAttribute, CategoryParts, CategoryUpdate, NewCategory,
};
