//! Stock Records

use jiff::Timestamp;

use crate::domain::products::records::ProductUuid;

/// Stock Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockRecord {
    pub product_uuid: ProductUuid,
    pub quantity_available: u32,
    pub last_updated_at: Timestamp,
}
