//! Orders Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use rust_decimal::Decimal;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};
use tracing::debug;
use uuid::Uuid;

use crate::domain::{
    caller::AccountUuid,
    orders::records::{OrderRecord, OrderStatus, OrderUuid, PaymentStatus},
};

const CREATE_ORDER_SQL: &str = include_str!("../sql/create_order.sql");
const GET_ORDER_SQL: &str = include_str!("../sql/get_order.sql");
const LOCK_ORDER_SQL: &str = include_str!("../sql/lock_order.sql");
const LIST_ORDERS_SQL: &str = include_str!("../sql/list_orders.sql");
const UPDATE_ORDER_STATUS_SQL: &str = include_str!("../sql/update_order_status.sql");
const SUPPLIER_HAS_PRODUCT_IN_ORDER_SQL: &str =
    include_str!("../sql/supplier_has_product_in_order.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrdersRepository;

impl PgOrdersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        customer: AccountUuid,
        shipping_address: &str,
        total_amount: Decimal,
    ) -> Result<(), sqlx::Error> {
        query(CREATE_ORDER_SQL)
            .bind(order.into_uuid())
            .bind(customer.into_uuid())
            .bind(shipping_address)
            .bind(total_amount)
            .execute(&mut **tx)
            .await?;

        debug!(order_uuid = %order, customer_uuid = %customer, %total_amount, "created order");

        Ok(())
    }

    /// Order header without lines, payment or shipment.
    pub(crate) async fn get_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(GET_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Like [`Self::get_order`], holding the row lock until the transaction
    /// ends.
    pub(crate) async fn lock_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(LOCK_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Order headers, newest first; `None` lists every customer's orders.
    pub(crate) async fn list_orders(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        customer: Option<AccountUuid>,
    ) -> Result<Vec<OrderRecord>, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(LIST_ORDERS_SQL)
            .bind(customer.map(AccountUuid::into_uuid))
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn update_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        status: OrderStatus,
        payment_status: PaymentStatus,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(UPDATE_ORDER_STATUS_SQL)
            .bind(order.into_uuid())
            .bind(status.as_str())
            .bind(payment_status.as_str())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        debug!(
            order_uuid = %order,
            status = status.as_str(),
            payment_status = payment_status.as_str(),
            rows_affected,
            "updated order status"
        );

        Ok(rows_affected)
    }

    pub(crate) async fn supplier_has_product_in_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        supplier: AccountUuid,
    ) -> Result<bool, sqlx::Error> {
        query_scalar::<Postgres, bool>(SUPPLIER_HAS_PRODUCT_IN_ORDER_SQL)
            .bind(order.into_uuid())
            .bind(supplier.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for OrderRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let status: String = row.try_get("status")?;
        let payment_status: String = row.try_get("payment_status")?;

        let status =
            OrderStatus::try_from(status.as_str()).map_err(|e| sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: e.into(),
            })?;

        let payment_status = PaymentStatus::try_from(payment_status.as_str()).map_err(|e| {
            sqlx::Error::ColumnDecode {
                index: "payment_status".to_string(),
                source: e.into(),
            }
        })?;

        Ok(Self {
            uuid: OrderUuid::from_uuid(row.try_get::<Uuid, _>("uuid")?),
            customer_uuid: AccountUuid::from_uuid(row.try_get("customer_uuid")?),
            status,
            payment_status,
            shipping_address: row.try_get("shipping_address")?,
            total_amount: row.try_get("total_amount")?,
            lines: Vec::new(),
            payment: None,
            shipment: None,
            ordered_at: row.try_get::<SqlxTimestamp, _>("ordered_at")?.to_jiff(),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
