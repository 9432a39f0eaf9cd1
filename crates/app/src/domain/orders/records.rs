//! Order Records

use jiff::Timestamp;
use rust_decimal::Decimal;

use crate::{
    domain::{caller::AccountUuid, products::records::ProductUuid},
    uuids::TypedUuid,
};

/// Order UUID
pub type OrderUuid = TypedUuid<OrderRecord>;

/// Order Line UUID
pub type OrderLineUuid = TypedUuid<OrderLineRecord>;

/// Payment UUID
pub type PaymentUuid = TypedUuid<PaymentRecord>;

/// Shipment UUID
pub type ShipmentUuid = TypedUuid<ShipmentRecord>;

/// Fulfilment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    PendingPayment,
    Paid,
    Shipped,
    Completed,
    Cancelled,
}

impl OrderStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PendingPayment => "pending_payment",
            Self::Paid => "paid",
            Self::Shipped => "shipped",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Transitions available to status updates.
    ///
    /// `PendingPayment -> Paid` is not listed; only payment confirmation
    /// performs it.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::PendingPayment | Self::Paid, Self::Cancelled)
                | (Self::Paid, Self::Shipped)
                | (Self::Shipped, Self::Completed)
        )
    }
}

impl TryFrom<&str> for OrderStatus {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending_payment" => Ok(Self::PendingPayment),
            "paid" => Ok(Self::Paid),
            "shipped" => Ok(Self::Shipped),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown order status `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Refunded,
}

impl PaymentStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Paid => "paid",
            Self::Refunded => "refunded",
        }
    }
}

impl TryFrom<&str> for PaymentStatus {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "unpaid" => Ok(Self::Unpaid),
            "paid" => Ok(Self::Paid),
            "refunded" => Ok(Self::Refunded),
            other => Err(format!("unknown payment status `{other}`")),
        }
    }
}

/// Order Record
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub uuid: OrderUuid,
    pub customer_uuid: AccountUuid,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub shipping_address: String,
    pub total_amount: Decimal,
    pub lines: Vec<OrderLineRecord>,
    pub payment: Option<PaymentRecord>,
    pub shipment: Option<ShipmentRecord>,
    pub ordered_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Order Line Record
///
/// Prices are frozen when the order is placed.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLineRecord {
    pub uuid: OrderLineUuid,
    pub position: u32,
    pub product_uuid: ProductUuid,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// Payment Record
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRecord {
    pub uuid: PaymentUuid,
    pub amount: Decimal,
    pub method: String,
    pub reference: Option<String>,
    pub paid_at: Timestamp,
}

/// Shipment Record
#[derive(Debug, Clone, PartialEq)]
pub struct ShipmentRecord {
    pub uuid: ShipmentUuid,
    pub carrier: String,
    pub tracking_number: Option<String>,
    pub shipped_at: Timestamp,
    pub delivered_at: Option<Timestamp>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [OrderStatus; 5] = [
        OrderStatus::PendingPayment,
        OrderStatus::Paid,
        OrderStatus::Shipped,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    #[test]
    fn terminal_states_allow_no_transition() {
        for from in [OrderStatus::Completed, OrderStatus::Cancelled] {
            for to in ALL {
                assert!(!from.can_transition_to(to), "{from:?} -> {to:?}");
            }
        }
    }

    #[test]
    fn paid_is_not_reachable_through_status_updates() {
        for from in ALL {
            assert!(!from.can_transition_to(OrderStatus::Paid), "{from:?}");
        }
    }

    #[test]
    fn forward_transitions_are_allowed() {
        assert!(OrderStatus::Paid.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Completed));
        assert!(OrderStatus::PendingPayment.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Paid.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn shipped_orders_cannot_be_cancelled_or_skip_ahead() {
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::PendingPayment.can_transition_to(OrderStatus::Shipped));
        assert!(!OrderStatus::Paid.can_transition_to(OrderStatus::Completed));
    }

    #[test]
    fn status_strings_round_trip() {
        for status in ALL {
            assert_eq!(OrderStatus::try_from(status.as_str()), Ok(status));
        }

        assert!(OrderStatus::try_from("lost").is_err());
        assert_eq!(PaymentStatus::try_from("refunded"), Ok(PaymentStatus::Refunded));
    }
}
