//! Product Records

use jiff::Timestamp;
use rust_decimal::Decimal;

use crate::{domain::caller::AccountUuid, uuids::TypedUuid};

/// Product UUID
pub type ProductUuid = TypedUuid<ProductRecord>;

/// Price UUID
pub type PriceUuid = TypedUuid<PriceRecord>;

/// Category marker; the category tree is managed elsewhere.
#[derive(Debug, Clone, Copy)]
pub struct Category;

/// Category UUID
pub type CategoryUuid = TypedUuid<Category>;

/// Moderation status of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductStatus {
    PendingApproval,
    Approved,
    Rejected,
}

impl ProductStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PendingApproval => "pending_approval",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl TryFrom<&str> for ProductStatus {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending_approval" => Ok(Self::PendingApproval),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown product status `{other}`")),
        }
    }
}

/// Product Record
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub uuid: ProductUuid,
    pub supplier_uuid: AccountUuid,
    pub category_uuid: Option<CategoryUuid>,
    pub name: String,
    pub description: String,
    pub status: ProductStatus,
    pub is_active: bool,
    pub is_featured: bool,
    pub is_listing_only: bool,
    pub is_suspended_by_supplier: bool,
    /// Final price of the authoritative current price row, if any.
    pub current_price: Option<Decimal>,
    pub quantity_available: u32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ProductRecord {
    /// Approved, active, not listing-only and not suspended.
    ///
    /// The same predicate decides public visibility and purchasability.
    #[must_use]
    pub fn is_publicly_available(&self) -> bool {
        self.status == ProductStatus::Approved
            && self.is_active
            && !self.is_listing_only
            && !self.is_suspended_by_supplier
    }
}

/// Price Record
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRecord {
    pub uuid: PriceUuid,
    pub product_uuid: ProductUuid,
    pub base_price: Decimal,
    pub markup_percentage: Decimal,
    pub final_price: Decimal,
    pub is_current: bool,
    pub valid_from: Option<Timestamp>,
    pub valid_to: Option<Timestamp>,
    pub created_at: Timestamp,
}
