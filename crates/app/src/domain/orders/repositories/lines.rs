//! Order Lines Repository

use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query};
use tracing::debug;

use crate::{
    domain::{
        orders::{
            records::{OrderLineRecord, OrderLineUuid, OrderUuid},
            workflow::PricedLine,
        },
        products::records::ProductUuid,
        stock::repository::{quantity_to_i32, try_get_quantity},
    },
    uuids::into_uuids,
};

use super::keyed_by_order;

const CREATE_ORDER_LINES_SQL: &str = include_str!("../sql/create_order_lines.sql");
const GET_ORDER_LINES_SQL: &str = include_str!("../sql/get_order_lines.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrderLinesRepository;

impl PgOrderLinesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Insert every line of an order in one statement, numbered in slice order.
    pub(crate) async fn create_order_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        lines: &[PricedLine],
    ) -> Result<u64, sqlx::Error> {
        let mut positions = Vec::with_capacity(lines.len());
        let mut quantities = Vec::with_capacity(lines.len());

        for (position, line) in lines.iter().enumerate() {
            positions.push(i32::try_from(position).map_err(|e| sqlx::Error::Encode(e.into()))?);
            quantities.push(quantity_to_i32(line.quantity, "quantity")?);
        }

        let uuids: Vec<OrderLineUuid> = lines.iter().map(|_| OrderLineUuid::new()).collect();
        let products: Vec<ProductUuid> = lines.iter().map(|line| line.product_uuid).collect();

        let rows_affected = query(CREATE_ORDER_LINES_SQL)
            .bind(order.into_uuid())
            .bind(into_uuids(&uuids))
            .bind(positions)
            .bind(into_uuids(&products))
            .bind(quantities)
            .bind(lines.iter().map(|line| line.unit_price).collect::<Vec<_>>())
            .bind(lines.iter().map(|line| line.line_total).collect::<Vec<_>>())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        debug!(order_uuid = %order, rows_affected, "created order lines");

        Ok(rows_affected)
    }

    pub(crate) async fn get_order_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        orders: &[OrderUuid],
    ) -> Result<Vec<(OrderUuid, OrderLineRecord)>, sqlx::Error> {
        let rows = query(GET_ORDER_LINES_SQL)
            .bind(into_uuids(orders))
            .fetch_all(&mut **tx)
            .await?;

        keyed_by_order(&rows)
    }
}

impl<'r> FromRow<'r, PgRow> for OrderLineRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: OrderLineUuid::from_uuid(row.try_get("uuid")?),
            position: try_get_quantity(row, "position")?,
            product_uuid: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            quantity: try_get_quantity(row, "quantity")?,
            unit_price: row.try_get("unit_price")?,
            line_total: row.try_get("line_total")?,
        })
    }
}
