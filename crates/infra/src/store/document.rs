//! Mapping between aggregates and their stored documents.

use std::collections::HashMap;

use uuid::Uuid;

use catalog_attributes::Attribute;
use catalog_categories::Category;
use catalog_core::{AggregateRoot, AttributeId, CategoryId, ProductId};
use catalog_products::Product;

use super::database::Tables;
use super::{Collection, StoreError};

/// Value of a unique secondary index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueKey {
    pub index: &'static str,
    pub value: String,
}

/// An aggregate that can be stored as a whole document.
pub trait Document: AggregateRoot + Clone + Send + Sync + 'static {
    const COLLECTION: Collection;

    fn key(id: &Self::Id) -> Uuid;

    fn table(tables: &Tables) -> &HashMap<Self::Id, Self>;

    fn table_mut(tables: &mut Tables) -> &mut HashMap<Self::Id, Self>;

    /// The same aggregate carrying a store-assigned version.
    fn at_version(&self, version: u64) -> Self;

    fn unique_key(&self) -> Option<UniqueKey> {
        None
    }
}

impl Document for Attribute {
    const COLLECTION: Collection = Collection::Attributes;

    fn key(id: &AttributeId) -> Uuid {
        *id.as_uuid()
    }

    fn table(tables: &Tables) -> &HashMap<AttributeId, Self> {
        &tables.attributes
    }

    fn table_mut(tables: &mut Tables) -> &mut HashMap<AttributeId, Self> {
        &mut tables.attributes
    }

    fn at_version(&self, version: u64) -> Self {
        let mut parts = self.to_parts();
        parts.version = version;
        Attribute::reconstruct(parts)
    }

    fn unique_key(&self) -> Option<UniqueKey> {
        Some(UniqueKey {
            index: "slug",
            value: self.slug().to_string(),
        })
    }
}

impl Document for Category {
    const COLLECTION: Collection = Collection::Categories;

    fn key(id: &CategoryId) -> Uuid {
        *id.as_uuid()
    }

    fn table(tables: &Tables) -> &HashMap<CategoryId, Self> {
        &tables.categories
    }

    fn table_mut(tables: &mut Tables) -> &mut HashMap<CategoryId, Self> {
        &mut tables.categories
    }

    fn at_version(&self, version: u64) -> Self {
        let mut parts = self.to_parts();
        parts.version = version;
        Category::reconstruct(parts)
    }
}

impl Document for Product {
    const COLLECTION: Collection = Collection::Products;

    fn key(id: &ProductId) -> Uuid {
        *id.as_uuid()
    }

    fn table(tables: &Tables) -> &HashMap<ProductId, Self> {
        &tables.products
    }

    fn table_mut(tables: &mut Tables) -> &mut HashMap<ProductId, Self> {
        &mut tables.products
    }

    fn at_version(&self, version: u64) -> Self {
        let mut parts = self.to_parts();
        parts.version = version;
        Product::reconstruct(parts)
    }
}

pub(crate) fn check_insert<A: Document>(tables: &Tables, doc: &A) -> Result<(), StoreError> {
    let table = A::table(tables);
    if table.contains_key(doc.id()) {
        return Err(StoreError::DuplicateKey {
            collection: A::COLLECTION,
            index: "_id",
            value: doc.id().to_string(),
        });
    }
    check_unique(table, doc)
}

/// Returns the version the update will be written with.
pub(crate) fn check_update<A: Document>(tables: &Tables, doc: &A) -> Result<u64, StoreError> {
    let table = A::table(tables);
    let current = table
        .get(doc.id())
        .ok_or_else(|| StoreError::not_found(A::COLLECTION, A::key(doc.id())))?;

    if current.version() != doc.version() {
        return Err(StoreError::VersionConflict {
            collection: A::COLLECTION,
            id: A::key(doc.id()),
            expected: doc.version(),
            actual: current.version(),
        });
    }

    check_unique(table, doc)?;
    Ok(doc.version() + 1)
}

pub(crate) fn apply_insert<A: Document>(tables: &mut Tables, doc: A) -> Result<(), StoreError> {
    check_insert(tables, &doc)?;
    A::table_mut(tables).insert(*doc.id(), doc);
    Ok(())
}

pub(crate) fn apply_update<A: Document>(tables: &mut Tables, doc: A) -> Result<(), StoreError> {
    let next = check_update(tables, &doc)?;
    A::table_mut(tables).insert(*doc.id(), doc.at_version(next));
    Ok(())
}

fn check_unique<A: Document>(table: &HashMap<A::Id, A>, doc: &A) -> Result<(), StoreError> {
    let Some(key) = doc.unique_key() else {
        return Ok(());
    };

    let taken = table
        .values()
        .any(|other| other.id() != doc.id() && other.unique_key().as_ref() == Some(&key));

    if taken {
        return Err(StoreError::DuplicateKey {
            collection: A::COLLECTION,
            index: key.index,
            value: key.value,
        });
    }
    Ok(())
}
