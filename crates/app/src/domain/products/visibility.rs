//! Product Visibility Filter

use uuid::Uuid;

use crate::domain::{
    caller::{AccountUuid, CallerContext},
    products::{data::ProductQuery, records::ProductRecord},
};

/// Which products a query may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Every product regardless of status or flags.
    Unrestricted,

    /// The supplier's own products plus everything publicly available.
    OwnedOrPublic(AccountUuid),

    /// Approved, active, not listing-only and not suspended products.
    PublicOnly,
}

impl Visibility {
    /// First matching rule wins: staff, then identified supplier, then public.
    #[must_use]
    pub fn for_caller(caller: &CallerContext) -> Self {
        if caller.is_staff() {
            return Self::Unrestricted;
        }

        match caller.supplier_identity() {
            Some(supplier) => Self::OwnedOrPublic(supplier),
            None => Self::PublicOnly,
        }
    }

    /// In-memory form of the predicate the repository pushes into SQL.
    #[must_use]
    pub fn permits(&self, product: &ProductRecord) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::OwnedOrPublic(supplier) => {
                product.supplier_uuid == *supplier || product.is_publicly_available()
            }
            Self::PublicOnly => product.is_publicly_available(),
        }
    }

    /// Bind values for the SQL predicate
    /// `($1 OR products.supplier_uuid = $2 OR <publicly available>)`.
    pub(crate) fn sql_binds(&self) -> (bool, Option<Uuid>) {
        match self {
            Self::Unrestricted => (true, None),
            Self::OwnedOrPublic(supplier) => (false, Some(supplier.into_uuid())),
            Self::PublicOnly => (false, None),
        }
    }
}

/// Scope a product query to what `caller` may see.
#[must_use]
pub fn apply_visibility_filter(query: ProductQuery, caller: &CallerContext) -> ProductQuery {
    ProductQuery {
        visibility: Visibility::for_caller(caller),
        ..query
    }
}
