//! Stock Reservation
//!
//! Decision logic over stock levels read inside the order transaction. The
//! ledger never hands out mutable references to its levels; a reservation
//! either applies to every line or leaves the ledger untouched, and produces
//! the adjustments the repository writes back in the same transaction.

use jiff::Timestamp;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::domain::{
    products::records::ProductUuid,
    stock::{errors::StockError, records::StockRecord},
};

/// What a reservation needs to know about an order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservationLine {
    pub product_uuid: ProductUuid,
    pub quantity: u32,
}

/// Change to a single stock row, in line order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockAdjustment {
    pub product_uuid: ProductUuid,
    pub quantity: u32,
    pub quantity_before: u32,
    pub quantity_after: u32,
    pub last_updated_at: Timestamp,
}

/// Stock levels for the products touched by one order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockLedger {
    levels: FxHashMap<ProductUuid, StockRecord>,
}

impl StockLedger {
    #[must_use]
    pub fn new(records: impl IntoIterator<Item = StockRecord>) -> Self {
        Self {
            levels: records
                .into_iter()
                .map(|record| (record.product_uuid, record))
                .collect(),
        }
    }

    #[must_use]
    pub fn quantity_available(&self, product: ProductUuid) -> Option<u32> {
        self.levels
            .get(&product)
            .map(|record| record.quantity_available)
    }

    /// Reserve stock for every line, in order.
    ///
    /// Lines are applied sequentially against a working copy so repeated
    /// products deplete cumulatively. On failure the ledger is unchanged.
    ///
    /// # Errors
    ///
    /// - [`StockError::InvalidOrderLine`] for a zero quantity or a product
    ///   without a stock record.
    /// - [`StockError::InsufficientStock`] when a line asks for more than is
    ///   left.
    pub fn reserve(
        &mut self,
        lines: &[ReservationLine],
        now: Timestamp,
    ) -> Result<SmallVec<[StockAdjustment; 4]>, StockError> {
        let mut working = self.levels.clone();
        let mut adjustments = SmallVec::with_capacity(lines.len());

        for line in lines {
            let product = line.product_uuid;

            let record = working
                .get_mut(&product)
                .filter(|_| line.quantity > 0)
                .ok_or(StockError::InvalidOrderLine { product })?;

            let quantity_before = record.quantity_available;

            let quantity_after = quantity_before.checked_sub(line.quantity).ok_or(
                StockError::InsufficientStock {
                    product,
                    requested: line.quantity,
                    available: quantity_before,
                },
            )?;

            record.quantity_available = quantity_after;
            record.last_updated_at = now;

            adjustments.push(StockAdjustment {
                product_uuid: product,
                quantity: line.quantity,
                quantity_before,
                quantity_after,
                last_updated_at: now,
            });
        }

        self.levels = working;

        Ok(adjustments)
    }

    /// Return previously reserved quantities, e.g. when an order is cancelled.
    ///
    /// # Errors
    ///
    /// - [`StockError::InvalidOrderLine`] for a product without a stock record.
    /// - [`StockError::Overflow`] if a level would exceed `u32::MAX`.
    pub fn release(
        &mut self,
        lines: &[ReservationLine],
        now: Timestamp,
    ) -> Result<SmallVec<[StockAdjustment; 4]>, StockError> {
        let mut working = self.levels.clone();
        let mut adjustments = SmallVec::with_capacity(lines.len());

        for line in lines {
            let product = line.product_uuid;

            let record = working
                .get_mut(&product)
                .ok_or(StockError::InvalidOrderLine { product })?;

            let quantity_before = record.quantity_available;

            let quantity_after = quantity_before
                .checked_add(line.quantity)
                .ok_or(StockError::Overflow { product })?;

            record.quantity_available = quantity_after;
            record.last_updated_at = now;

            adjustments.push(StockAdjustment {
                product_uuid: product,
                quantity: line.quantity,
                quantity_before,
                quantity_after,
                last_updated_at: now,
            });
        }

        self.levels = working;

        Ok(adjustments)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn stock(product: ProductUuid, quantity_available: u32) -> StockRecord {
        StockRecord {
            product_uuid: product,
            quantity_available,
            last_updated_at: Timestamp::UNIX_EPOCH,
        }
    }

    fn line(product_uuid: ProductUuid, quantity: u32) -> ReservationLine {
        ReservationLine {
            product_uuid,
            quantity,
        }
    }

    #[test]
    fn reserve_decrements_each_line_and_stamps_time() -> TestResult {
        let apples = ProductUuid::new();
        let pears = ProductUuid::new();
        let mut ledger = StockLedger::new([stock(apples, 10), stock(pears, 3)]);
        let now = Timestamp::now();

        let adjustments = ledger.reserve(&[line(apples, 4), line(pears, 3)], now)?;

        assert_eq!(adjustments.len(), 2);
        assert_eq!(adjustments[0].quantity_before, 10);
        assert_eq!(adjustments[0].quantity_after, 6);
        assert_eq!(adjustments[1].quantity_after, 0);
        assert!(adjustments.iter().all(|a| a.last_updated_at == now));
        assert_eq!(ledger.quantity_available(apples), Some(6));
        assert_eq!(ledger.quantity_available(pears), Some(0));

        Ok(())
    }

    #[test]
    fn reserve_depletes_cumulatively_for_repeated_products() {
        let apples = ProductUuid::new();
        let mut ledger = StockLedger::new([stock(apples, 5)]);

        let result = ledger.reserve(&[line(apples, 3), line(apples, 3)], Timestamp::now());

        assert_eq!(
            result,
            Err(StockError::InsufficientStock {
                product: apples,
                requested: 3,
                available: 2,
            })
        );
    }

    #[test]
    fn failed_reservation_leaves_ledger_untouched() {
        let apples = ProductUuid::new();
        let pears = ProductUuid::new();
        let mut ledger = StockLedger::new([stock(apples, 10), stock(pears, 1)]);
        let before = ledger.clone();

        let result = ledger.reserve(&[line(apples, 4), line(pears, 2)], Timestamp::now());

        assert!(matches!(
            result,
            Err(StockError::InsufficientStock { product, .. }) if product == pears
        ));
        assert_eq!(ledger, before);
    }

    #[test]
    fn zero_quantity_line_is_invalid() {
        let apples = ProductUuid::new();
        let mut ledger = StockLedger::new([stock(apples, 10)]);

        let result = ledger.reserve(&[line(apples, 0)], Timestamp::now());

        assert_eq!(
            result,
            Err(StockError::InvalidOrderLine { product: apples })
        );
    }

    #[test]
    fn line_without_stock_record_is_invalid() {
        let apples = ProductUuid::new();
        let unknown = ProductUuid::new();
        let mut ledger = StockLedger::new([stock(apples, 10)]);

        let result = ledger.reserve(&[line(apples, 1), line(unknown, 1)], Timestamp::now());

        assert_eq!(
            result,
            Err(StockError::InvalidOrderLine { product: unknown })
        );
        assert_eq!(ledger.quantity_available(apples), Some(10));
    }

    #[test]
    fn reserving_exact_remaining_stock_succeeds() -> TestResult {
        let apples = ProductUuid::new();
        let mut ledger = StockLedger::new([stock(apples, 2)]);

        ledger.reserve(&[line(apples, 2)], Timestamp::now())?;

        assert_eq!(ledger.quantity_available(apples), Some(0));

        Ok(())
    }

    #[test]
    fn release_restores_quantities() -> TestResult {
        let apples = ProductUuid::new();
        let mut ledger = StockLedger::new([stock(apples, 1)]);

        let adjustments = ledger.release(&[line(apples, 4)], Timestamp::now())?;

        assert_eq!(adjustments[0].quantity_after, 5);
        assert_eq!(ledger.quantity_available(apples), Some(5));

        Ok(())
    }

    #[test]
    fn release_rejects_overflow() {
        let apples = ProductUuid::new();
        let mut ledger = StockLedger::new([stock(apples, u32::MAX)]);

        let result = ledger.release(&[line(apples, 1)], Timestamp::now());

        assert_eq!(result, Err(StockError::Overflow { product: apples }));
    }
}
