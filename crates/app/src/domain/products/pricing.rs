//! Pricing
//!
//! Order pricing reads the frozen `final_price` of the authoritative price
//! row. Nothing here recomputes a price from a product's base and markup at
//! order time; [`final_price`] is only used when a price row is written.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::products::records::PriceRecord;

/// Minor-unit precision of stored monetary amounts.
pub const MONEY_SCALE: u32 = 2;

/// Round a monetary amount to cents, half away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// `base + base * markup / 100`, rounded to cents.
#[must_use]
pub fn final_price(base_price: Decimal, markup_percentage: Decimal) -> Decimal {
    round_money(base_price + base_price * markup_percentage / Decimal::ONE_HUNDRED)
}

/// Pick the authoritative current price among a product's price rows.
///
/// Only rows flagged `is_current` qualify. The latest `valid_from` wins and a
/// missing `valid_from` sorts as earliest; equal `valid_from` values fall back
/// to the most recently created row.
#[must_use]
pub fn select_current_price(prices: &[PriceRecord]) -> Option<&PriceRecord> {
    prices
        .iter()
        .filter(|price| price.is_current)
        .max_by(|a, b| {
            a.valid_from
                .cmp(&b.valid_from)
                .then_with(|| a.created_at.cmp(&b.created_at))
        })
}
