//! Order Data

use crate::domain::{
    orders::records::{OrderStatus, OrderUuid, PaymentUuid, ShipmentUuid},
    products::records::ProductUuid,
};

/// Requested product and quantity, before consolidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderItem {
    pub product_uuid: ProductUuid,
    pub quantity: u32,
}

/// Checkout request.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub uuid: OrderUuid,
    pub items: Vec<OrderItem>,
    pub shipping_address: Option<String>,
}

/// Payment confirmation; the amount is always the order total.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    pub uuid: PaymentUuid,
    pub method: String,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewShipment {
    pub uuid: ShipmentUuid,
    pub carrier: String,
    pub tracking_number: Option<String>,
}

/// Status change requested by a supplier or staff member.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusUpdate {
    Ship(NewShipment),
    Complete,
    Cancel,
}

impl StatusUpdate {
    #[must_use]
    pub const fn target(&self) -> OrderStatus {
        match self {
            Self::Ship(_) => OrderStatus::Shipped,
            Self::Complete => OrderStatus::Completed,
            Self::Cancel => OrderStatus::Cancelled,
        }
    }
}
