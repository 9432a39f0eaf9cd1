//! Stock errors.

use thiserror::Error;

use crate::domain::products::records::ProductUuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockError {
    /// Line has a zero quantity or no stock record behind its product.
    #[error("invalid order line for product {product}")]
    InvalidOrderLine { product: ProductUuid },

    #[error("insufficient stock for product {product}: requested {requested}, available {available}")]
    InsufficientStock {
        product: ProductUuid,
        requested: u32,
        available: u32,
    },

    #[error("stock quantity overflow for product {product}")]
    Overflow { product: ProductUuid },
}
