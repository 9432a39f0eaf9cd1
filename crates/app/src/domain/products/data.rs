//! Products Data

use rust_decimal::Decimal;

use crate::domain::products::{
    records::{CategoryUuid, ProductUuid},
    visibility::Visibility,
};

/// New Product Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub uuid: ProductUuid,
    pub name: String,
    pub description: String,
    pub category_uuid: Option<CategoryUuid>,
    pub base_price: Decimal,
    pub markup_percentage: Decimal,
    pub initial_stock: u32,
    pub is_listing_only: bool,
}

/// Product Update Data
#[derive(Debug, Clone, PartialEq)]
pub struct ProductUpdate {
    pub name: String,
    pub description: String,
    pub category_uuid: Option<CategoryUuid>,
    pub is_listing_only: bool,
}

/// Moderation decision taken by staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductReview {
    Approve { featured: bool },
    Reject,
}

/// Product listing query.
///
/// Built by callers with paging options, then scoped with
/// [`apply_visibility_filter`](super::apply_visibility_filter) before it
/// reaches the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub limit: u32,
    pub offset: u32,
    pub featured_only: bool,
    pub visibility: Visibility,
}

impl ProductQuery {
    pub const DEFAULT_LIMIT: u32 = 50;

    #[must_use]
    pub fn page(limit: u32, offset: u32) -> Self {
        Self {
            limit,
            offset,
            ..Self::default()
        }
    }
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            limit: Self::DEFAULT_LIMIT,
            offset: 0,
            featured_only: false,
            visibility: Visibility::PublicOnly,
        }
    }
}
