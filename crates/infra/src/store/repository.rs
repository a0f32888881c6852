//! Repository contracts.

use core::str::FromStr;

use catalog_attributes::{Attribute, AttributeType};
use catalog_categories::Category;
use catalog_core::CategoryId;
use catalog_products::Product;

use crate::context::RequestContext;

use super::database::Transaction;
use super::document::Document;
use super::StoreError;

/// Persistence contract shared by every aggregate kind.
///
/// Writes go through a [`Transaction`]; reads see committed state.
pub trait Repository<A: Document>: Send + Sync {
    /// Stage an insert. Fails on a duplicate id or unique key.
    fn insert(&self, tx: &mut Transaction<'_>, aggregate: &A) -> Result<(), StoreError>;

    /// Stage a write conditioned on `aggregate.version()` still being the
    /// stored version. Returns the aggregate as it will be stored (version + 1).
    fn update(&self, tx: &mut Transaction<'_>, aggregate: &A) -> Result<A, StoreError>;

    fn find_by_id(&self, ctx: &RequestContext, id: A::Id) -> Result<A, StoreError>;

    /// Found aggregates in request order; unknown ids are skipped.
    fn find_by_ids(&self, ctx: &RequestContext, ids: &[A::Id]) -> Result<Vec<A>, StoreError>;

    /// Like [`Repository::find_by_ids`] but fails with
    /// [`StoreError::MissingIds`] unless every id resolves.
    fn find_by_ids_or_fail(&self, ctx: &RequestContext, ids: &[A::Id]) -> Result<Vec<A>, StoreError>;

    fn exists(&self, ctx: &RequestContext, id: A::Id) -> Result<bool, StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(StoreError::InvalidQuery(format!("unknown sort order '{other}'"))),
        }
    }
}

/// Sortable document fields. Not every field applies to every collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    Slug,
    Type,
    Price,
    Quantity,
    CreatedAt,
    ModifiedAt,
    Version,
}

impl FromStr for SortField {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(SortField::Name),
            "slug" => Ok(SortField::Slug),
            "type" => Ok(SortField::Type),
            "price" => Ok(SortField::Price),
            "quantity" => Ok(SortField::Quantity),
            "createdAt" => Ok(SortField::CreatedAt),
            "modifiedAt" => Ok(SortField::ModifiedAt),
            "version" => Ok(SortField::Version),
            other => Err(StoreError::InvalidQuery(format!("unknown sort field '{other}'"))),
        }
    }
}

/// One page of a list query. `page` is 1-based; `total` counts every match.
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult<A> {
    pub items: Vec<A>,
    pub page: u32,
    pub size: u32,
    pub total: usize,
}

impl<A> PageResult<A> {
    pub fn total_pages(&self) -> usize {
        if self.size == 0 {
            return 0;
        }
        self.total.div_ceil(self.size as usize)
    }
}

// `page` is 1-based. A missing `page` or `size` falls back to the
// repository's configured paging; sizes are capped at its maximum.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeListQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub enabled: Option<bool>,
    pub attribute_type: Option<AttributeType>,
    pub sort: Option<SortField>,
    pub order: SortOrder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryListQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub enabled: Option<bool>,
    pub sort: Option<SortField>,
    pub order: SortOrder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductListQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub enabled: Option<bool>,
    pub category_id: Option<CategoryId>,
    pub sort: Option<SortField>,
    pub order: SortOrder,
}

macro_rules! impl_default_query {
    ($t:ty { $($field:ident),* }) => {
        impl Default for $t {
            fn default() -> Self {
                Self {
                    page: None,
                    size: None,
                    $($field: None,)*
                    sort: None,
                    order: SortOrder::Asc,
                }
            }
        }
    };
}

impl_default_query!(AttributeListQuery { enabled, attribute_type });
impl_default_query!(CategoryListQuery { enabled });
impl_default_query!(ProductListQuery { enabled, category_id });

pub trait AttributeQueries: Repository<Attribute> {
    fn find_list(
        &self,
        ctx: &RequestContext,
        query: &AttributeListQuery,
    ) -> Result<PageResult<Attribute>, StoreError>;
}

pub trait CategoryQueries: Repository<Category> {
    fn find_list(
        &self,
        ctx: &RequestContext,
        query: &CategoryListQuery,
    ) -> Result<PageResult<Category>, StoreError>;
}

pub trait ProductQueries: Repository<Product> {
    fn find_list(
        &self,
        ctx: &RequestContext,
        query: &ProductListQuery,
    ) -> Result<PageResult<Product>, StoreError>;
}
