//! Order Workflow
//!
//! Pure steps of checkout: consolidating the requested items, resolving the
//! shipping address and locking in prices. The service runs them in order
//! inside the order transaction and hands the priced lines to stock
//! reservation.

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::domain::{
    orders::{data::OrderItem, errors::OrdersServiceError},
    products::{
        pricing::{round_money, select_current_price},
        records::{PriceRecord, ProductRecord, ProductStatus, ProductUuid},
    },
    stock::ReservationLine,
};

/// Consolidated line with its price locked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub product_uuid: ProductUuid,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

impl From<&PricedLine> for ReservationLine {
    fn from(line: &PricedLine) -> Self {
        Self {
            product_uuid: line.product_uuid,
            quantity: line.quantity,
        }
    }
}

/// Merge repeated products into one item with the summed quantity.
///
/// Items keep the position of the first occurrence of their product.
///
/// # Errors
///
/// - [`OrdersServiceError::EmptyOrder`] when nothing was requested.
/// - [`OrdersServiceError::InvalidQuantity`] for a zero quantity, or when a
///   summed quantity no longer fits.
pub fn consolidate_items(items: &[OrderItem]) -> Result<Vec<OrderItem>, OrdersServiceError> {
    if items.is_empty() {
        return Err(OrdersServiceError::EmptyOrder);
    }

    let mut positions: FxHashMap<ProductUuid, usize> = FxHashMap::default();
    let mut consolidated: Vec<OrderItem> = Vec::with_capacity(items.len());

    for item in items {
        if item.quantity == 0 {
            return Err(OrdersServiceError::InvalidQuantity);
        }

        match positions.get(&item.product_uuid) {
            Some(&position) => {
                let existing = &mut consolidated[position];

                existing.quantity = existing
                    .quantity
                    .checked_add(item.quantity)
                    .ok_or(OrdersServiceError::InvalidQuantity)?;
            }
            None => {
                positions.insert(item.product_uuid, consolidated.len());
                consolidated.push(*item);
            }
        }
    }

    Ok(consolidated)
}

/// Trimmed address, or `None` when absent or blank.
#[must_use]
pub fn non_blank_address(address: Option<&str>) -> Option<String> {
    address
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .map(ToString::to_string)
}

/// Price each consolidated item against the loaded products and price rows.
///
/// Products are checked in item order and the first ineligible product stops
/// the order.
///
/// # Errors
///
/// - [`OrdersServiceError::ProductsNotFound`] naming every item whose product
///   was not loaded.
/// - [`OrdersServiceError::ProductNotPurchasable`] for listing-only,
///   suspended, unapproved or inactive products.
/// - [`OrdersServiceError::NoCurrentPrice`] when no price row is current.
pub fn price_lines(
    items: &[OrderItem],
    products: &[ProductRecord],
    prices: &[PriceRecord],
) -> Result<Vec<PricedLine>, OrdersServiceError> {
    let products: FxHashMap<ProductUuid, &ProductRecord> = products
        .iter()
        .map(|product| (product.uuid, product))
        .collect();

    let missing: Vec<ProductUuid> = items
        .iter()
        .map(|item| item.product_uuid)
        .filter(|uuid| !products.contains_key(uuid))
        .collect();

    if !missing.is_empty() {
        return Err(OrdersServiceError::ProductsNotFound(missing));
    }

    let mut prices_by_product: FxHashMap<ProductUuid, SmallVec<[PriceRecord; 1]>> =
        FxHashMap::default();

    for price in prices {
        prices_by_product
            .entry(price.product_uuid)
            .or_default()
            .push(price.clone());
    }

    items
        .iter()
        .map(|item| {
            let product = item.product_uuid;

            let record = products
                .get(&product)
                .ok_or_else(|| OrdersServiceError::ProductsNotFound(vec![product]))?;

            ensure_purchasable(record)?;

            let unit_price = prices_by_product
                .get(&product)
                .and_then(|prices| select_current_price(prices))
                .map(|price| price.final_price)
                .ok_or(OrdersServiceError::NoCurrentPrice { product })?;

            Ok(PricedLine {
                product_uuid: product,
                quantity: item.quantity,
                unit_price,
                line_total: round_money(unit_price * Decimal::from(item.quantity)),
            })
        })
        .collect()
}

fn ensure_purchasable(product: &ProductRecord) -> Result<(), OrdersServiceError> {
    let rejected = product.is_listing_only
        || product.is_suspended_by_supplier
        || product.status != ProductStatus::Approved
        || !product.is_active;

    if rejected {
        return Err(OrdersServiceError::ProductNotPurchasable {
            product: product.uuid,
        });
    }

    Ok(())
}

/// Sum of the line totals.
#[must_use]
pub fn order_total(lines: &[PricedLine]) -> Decimal {
    lines
        .iter()
        .fold(Decimal::ZERO, |total, line| total + line.line_total)
}
