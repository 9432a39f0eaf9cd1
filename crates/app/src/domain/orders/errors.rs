//! Orders service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::{
    customers::CustomersServiceError,
    orders::records::OrderStatus,
    products::records::ProductUuid,
    stock::StockError,
};

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error("order has no items")]
    EmptyOrder,

    #[error("order item quantities must be at least 1")]
    InvalidQuantity,

    #[error("no shipping address given and no default on file")]
    MissingShippingAddress,

    #[error("products not found: {}", display_uuids(.0))]
    ProductsNotFound(Vec<ProductUuid>),

    #[error("product {product} cannot be purchased")]
    ProductNotPurchasable { product: ProductUuid },

    #[error("product {product} has no current price")]
    NoCurrentPrice { product: ProductUuid },

    #[error("insufficient stock for product {product}")]
    InsufficientStock { product: ProductUuid },

    /// Order line without product or stock behind it.
    #[error("invalid order line for product {product}")]
    InvalidOrderLine { product: ProductUuid },

    #[error("caller has no account identity")]
    Unauthenticated,

    #[error("not permitted")]
    Forbidden,

    #[error("order not found")]
    NotFound,

    #[error("order cannot move from {} to {}", .from.as_str(), .to.as_str())]
    IllegalTransition { from: OrderStatus, to: OrderStatus },

    #[error("order already exists")]
    AlreadyExists,

    #[error("invalid data")]
    InvalidData,

    #[error("customer lookup failed")]
    Customers(#[source] CustomersServiceError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl OrdersServiceError {
    /// Business-rule rejection, as opposed to a system fault.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        !matches!(
            self,
            Self::InvalidOrderLine { .. } | Self::Customers(_) | Self::Sql(_)
        )
    }
}

fn display_uuids(products: &[ProductUuid]) -> String {
    products
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<StockError> for OrdersServiceError {
    fn from(error: StockError) -> Self {
        match error {
            StockError::InsufficientStock { product, .. } => Self::InsufficientStock { product },
            StockError::InvalidOrderLine { product } | StockError::Overflow { product } => {
                Self::InvalidOrderLine { product }
            }
        }
    }
}

impl From<CustomersServiceError> for OrdersServiceError {
    fn from(error: CustomersServiceError) -> Self {
        Self::Customers(error)
    }
}

impl From<Error> for OrdersServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::CheckViolation | ErrorKind::NotNullViolation) => Self::InvalidData,
            _ => Self::Sql(error),
        }
    }
}
