//! Payments Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use rust_decimal::Decimal;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::{
    domain::orders::{
        data::NewPayment,
        records::{OrderUuid, PaymentRecord, PaymentUuid},
    },
    uuids::into_uuids,
};

use super::keyed_by_order;

const CREATE_PAYMENT_SQL: &str = include_str!("../sql/create_payment.sql");
const GET_PAYMENTS_SQL: &str = include_str!("../sql/get_payments.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgPaymentsRepository;

impl PgPaymentsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_payment(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        payment: &NewPayment,
        amount: Decimal,
    ) -> Result<PaymentRecord, sqlx::Error> {
        query_as::<Postgres, PaymentRecord>(CREATE_PAYMENT_SQL)
            .bind(payment.uuid.into_uuid())
            .bind(order.into_uuid())
            .bind(amount)
            .bind(&payment.method)
            .bind(payment.reference.as_deref())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_payments(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        orders: &[OrderUuid],
    ) -> Result<Vec<(OrderUuid, PaymentRecord)>, sqlx::Error> {
        let rows = query(GET_PAYMENTS_SQL)
            .bind(into_uuids(orders))
            .fetch_all(&mut **tx)
            .await?;

        keyed_by_order(&rows)
    }
}

impl<'r> FromRow<'r, PgRow> for PaymentRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: PaymentUuid::from_uuid(row.try_get("uuid")?),
            amount: row.try_get("amount")?,
            method: row.try_get("method")?,
            reference: row.try_get("reference")?,
            paid_at: row.try_get::<SqlxTimestamp, _>("paid_at")?.to_jiff(),
        })
    }
}
