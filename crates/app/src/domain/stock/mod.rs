//! Stock

pub mod errors;
pub mod records;
pub(crate) mod repository;
pub mod reservation;

pub use errors::StockError;
pub use reservation::{ReservationLine, StockAdjustment, StockLedger};
