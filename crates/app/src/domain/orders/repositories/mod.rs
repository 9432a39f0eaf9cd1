//! Order Repositories

mod lines;
mod orders;
mod payments;
mod shipments;

use sqlx::{FromRow, Row, postgres::PgRow};

use crate::domain::orders::records::OrderUuid;

pub(crate) use lines::PgOrderLinesRepository;
pub(crate) use orders::PgOrdersRepository;
pub(crate) use payments::PgPaymentsRepository;
pub(crate) use shipments::PgShipmentsRepository;

/// Decode child rows of several orders, paired with the order they belong to.
fn keyed_by_order<T>(rows: &[PgRow]) -> Result<Vec<(OrderUuid, T)>, sqlx::Error>
where
    T: for<'r> FromRow<'r, PgRow>,
{
    rows.iter()
        .map(|row| {
            let order = OrderUuid::from_uuid(row.try_get("order_uuid")?);

            Ok((order, T::from_row(row)?))
        })
        .collect()
}
