use std::cmp::Ordering;
use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;

use catalog_attributes::Attribute;
use catalog_categories::Category;
use catalog_core::AggregateRoot;
use catalog_products::Product;

use crate::config::CatalogConfig;
use crate::context::RequestContext;

use super::database::{InMemoryDatabase, Transaction};
use super::document::{Document, apply_insert, apply_update, check_insert, check_update};
use super::repository::{
    AttributeListQuery, AttributeQueries, CategoryListQuery, CategoryQueries, PageResult,
    ProductListQuery, ProductQueries, Repository, SortField, SortOrder,
};
use super::StoreError;

/// Repository over an [`InMemoryDatabase`] collection.
///
/// List queries are paged with the limits of the repository's
/// [`CatalogConfig`].
#[derive(Debug)]
pub struct InMemoryRepository<A> {
    db: Arc<InMemoryDatabase>,
    config: CatalogConfig,
    _marker: PhantomData<fn() -> A>,
}

impl<A> InMemoryRepository<A> {
    pub fn new(db: Arc<InMemoryDatabase>) -> Self {
        Self::with_config(db, CatalogConfig::default())
    }

    pub fn with_config(db: Arc<InMemoryDatabase>, config: CatalogConfig) -> Self {
        Self {
            db,
            config,
            _marker: PhantomData,
        }
    }
}

impl<A> Clone for InMemoryRepository<A> {
    fn clone(&self) -> Self {
        Self::with_config(self.db.clone(), self.config.clone())
    }
}

impl<A: Document> Repository<A> for InMemoryRepository<A> {
    fn insert(&self, tx: &mut Transaction<'_>, aggregate: &A) -> Result<(), StoreError> {
        tx.context().ensure_active()?;
        // Fail early against committed state; the commit checks again.
        self.db.read(|t| check_insert(t, aggregate))??;

        let doc = aggregate.clone();
        tx.stage(move |t| apply_insert(t, doc));
        Ok(())
    }

    fn update(&self, tx: &mut Transaction<'_>, aggregate: &A) -> Result<A, StoreError> {
        tx.context().ensure_active()?;
        let next = self.db.read(|t| check_update(t, aggregate))??;

        let doc = aggregate.clone();
        tx.stage(move |t| apply_update(t, doc));
        Ok(aggregate.at_version(next))
    }

    fn find_by_id(&self, ctx: &RequestContext, id: A::Id) -> Result<A, StoreError> {
        ctx.ensure_active()?;
        self.db
            .read(|t| A::table(t).get(&id).cloned())?
            .ok_or_else(|| StoreError::not_found(A::COLLECTION, A::key(&id)))
    }

    fn find_by_ids(&self, ctx: &RequestContext, ids: &[A::Id]) -> Result<Vec<A>, StoreError> {
        ctx.ensure_active()?;
        let mut seen = HashSet::with_capacity(ids.len());
        self.db.read(|t| {
            let table = A::table(t);
            ids.iter()
                .filter(|id| seen.insert(**id))
                .filter_map(|id| table.get(id).cloned())
                .collect()
        })
    }

    fn find_by_ids_or_fail(&self, ctx: &RequestContext, ids: &[A::Id]) -> Result<Vec<A>, StoreError> {
        ctx.ensure_active()?;
        let mut seen = HashSet::with_capacity(ids.len());
        let (found, missing) = self.db.read(|t| {
            let table = A::table(t);
            let mut found = Vec::with_capacity(ids.len());
            let mut missing = Vec::new();
            for id in ids.iter().filter(|id| seen.insert(**id)) {
                match table.get(id) {
                    Some(doc) => found.push(doc.clone()),
                    None => missing.push(A::key(id)),
                }
            }
            (found, missing)
        })?;

        if !missing.is_empty() {
            return Err(StoreError::MissingIds {
                collection: A::COLLECTION,
                ids: missing,
            });
        }
        Ok(found)
    }

    fn exists(&self, ctx: &RequestContext, id: A::Id) -> Result<bool, StoreError> {
        ctx.ensure_active()?;
        self.db.read(|t| A::table(t).contains_key(&id))
    }
}

impl<A: Document> InMemoryRepository<A> {
    fn list<P, C>(
        &self,
        ctx: &RequestContext,
        page: Option<u32>,
        size: Option<u32>,
        order: SortOrder,
        filter: P,
        compare: C,
    ) -> Result<PageResult<A>, StoreError>
    where
        P: Fn(&A) -> bool,
        C: Fn(&A, &A) -> Ordering,
    {
        ctx.ensure_active()?;
        let (page, size) = self.config.page_request(page, size);

        let mut matches: Vec<A> = self
            .db
            .read(|t| A::table(t).values().filter(|doc| filter(doc)).cloned().collect())?;

        matches.sort_by(|a, b| {
            let ord = compare(a, b);
            match order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });

        let total = matches.len();
        let items = matches
            .into_iter()
            .skip((page as usize - 1) * size as usize)
            .take(size as usize)
            .collect();

        Ok(PageResult {
            items,
            page,
            size,
            total,
        })
    }
}

fn require_field(field: SortField, allowed: &[SortField]) -> Result<(), StoreError> {
    if allowed.contains(&field) {
        Ok(())
    } else {
        Err(StoreError::InvalidQuery(format!("cannot sort by {field:?}")))
    }
}

// Ties (and unsorted queries) fall back to creation time, then id.
fn attribute_order(field: Option<SortField>) -> impl Fn(&Attribute, &Attribute) -> Ordering {
    move |a, b| {
        let primary = match field {
            Some(SortField::Name) => a.name().cmp(b.name()),
            Some(SortField::Slug) => a.slug().cmp(b.slug()),
            Some(SortField::Type) => a.attribute_type().as_str().cmp(b.attribute_type().as_str()),
            Some(SortField::ModifiedAt) => a.modified_at().cmp(&b.modified_at()),
            Some(SortField::Version) => a.version().cmp(&b.version()),
            _ => Ordering::Equal,
        };
        primary
            .then_with(|| a.created_at().cmp(&b.created_at()))
            .then_with(|| a.id().cmp(b.id()))
    }
}

fn category_order(field: Option<SortField>) -> impl Fn(&Category, &Category) -> Ordering {
    move |a, b| {
        let primary = match field {
            Some(SortField::Name) => a.name().cmp(b.name()),
            Some(SortField::ModifiedAt) => a.modified_at().cmp(&b.modified_at()),
            Some(SortField::Version) => a.version().cmp(&b.version()),
            _ => Ordering::Equal,
        };
        primary
            .then_with(|| a.created_at().cmp(&b.created_at()))
            .then_with(|| a.id().cmp(b.id()))
    }
}

fn product_order(field: Option<SortField>) -> impl Fn(&Product, &Product) -> Ordering {
    move |a, b| {
        let primary = match field {
            Some(SortField::Name) => a.name().cmp(b.name()),
            Some(SortField::Price) => a.price().cmp(&b.price()),
            Some(SortField::Quantity) => a.quantity().cmp(&b.quantity()),
            Some(SortField::ModifiedAt) => a.modified_at().cmp(&b.modified_at()),
            Some(SortField::Version) => a.version().cmp(&b.version()),
            _ => Ordering::Equal,
        };
        primary
            .then_with(|| a.created_at().cmp(&b.created_at()))
            .then_with(|| a.id().cmp(b.id()))
    }
}

const ATTRIBUTE_FIELDS: [SortField; 6] = [
    SortField::Name,
    SortField::Slug,
    SortField::Type,
    SortField::CreatedAt,
    SortField::ModifiedAt,
    SortField::Version,
];

const CATEGORY_FIELDS: [SortField; 4] = [
    SortField::Name,
    SortField::CreatedAt,
    SortField::ModifiedAt,
    SortField::Version,
];

const PRODUCT_FIELDS: [SortField; 6] = [
    SortField::Name,
    SortField::Price,
    SortField::Quantity,
    SortField::CreatedAt,
    SortField::ModifiedAt,
    SortField::Version,
];

impl AttributeQueries for InMemoryRepository<Attribute> {
    fn find_list(
        &self,
        ctx: &RequestContext,
        query: &AttributeListQuery,
    ) -> Result<PageResult<Attribute>, StoreError> {
        if let Some(field) = query.sort {
            require_field(field, &ATTRIBUTE_FIELDS)?;
        }

        self.list(
            ctx,
            query.page,
            query.size,
            query.order,
            |a| {
                query.enabled.is_none_or(|e| a.enabled() == e)
                    && query.attribute_type.is_none_or(|t| a.attribute_type() == t)
            },
            attribute_order(query.sort),
        )
    }
}

impl CategoryQueries for InMemoryRepository<Category> {
    fn find_list(
        &self,
        ctx: &RequestContext,
        query: &CategoryListQuery,
    ) -> Result<PageResult<Category>, StoreError> {
        if let Some(field) = query.sort {
            require_field(field, &CATEGORY_FIELDS)?;
        }

        self.list(
            ctx,
            query.page,
            query.size,
            query.order,
            |c| query.enabled.is_none_or(|e| c.enabled() == e),
            category_order(query.sort),
        )
    }
}

impl ProductQueries for InMemoryRepository<Product> {
    fn find_list(
        &self,
        ctx: &RequestContext,
        query: &ProductListQuery,
    ) -> Result<PageResult<Product>, StoreError> {
        if let Some(field) = query.sort {
            require_field(field, &PRODUCT_FIELDS)?;
        }

        self.list(
            ctx,
            query.page,
            query.size,
            query.order,
            |p| {
                query.enabled.is_none_or(|e| p.enabled() == e)
                    && query.category_id.is_none_or(|id| p.category_id() == Some(id))
            },
            product_order(query.sort),
        )
    }
}
