//! Shipments Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::{
    domain::orders::{
        data::NewShipment,
        records::{OrderUuid, ShipmentRecord, ShipmentUuid},
    },
    uuids::into_uuids,
};

use super::keyed_by_order;

const CREATE_SHIPMENT_SQL: &str = include_str!("../sql/create_shipment.sql");
const MARK_DELIVERED_SQL: &str = include_str!("../sql/mark_delivered.sql");
const GET_SHIPMENTS_SQL: &str = include_str!("../sql/get_shipments.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgShipmentsRepository;

impl PgShipmentsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_shipment(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        shipment: &NewShipment,
    ) -> Result<ShipmentRecord, sqlx::Error> {
        query_as::<Postgres, ShipmentRecord>(CREATE_SHIPMENT_SQL)
            .bind(shipment.uuid.into_uuid())
            .bind(order.into_uuid())
            .bind(&shipment.carrier)
            .bind(shipment.tracking_number.as_deref())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn mark_delivered(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(MARK_DELIVERED_SQL)
            .bind(order.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn get_shipments(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        orders: &[OrderUuid],
    ) -> Result<Vec<(OrderUuid, ShipmentRecord)>, sqlx::Error> {
        let rows = query(GET_SHIPMENTS_SQL)
            .bind(into_uuids(orders))
            .fetch_all(&mut **tx)
            .await?;

        keyed_by_order(&rows)
    }
}

impl<'r> FromRow<'r, PgRow> for ShipmentRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: ShipmentUuid::from_uuid(row.try_get("uuid")?),
            carrier: row.try_get("carrier")?,
            tracking_number: row.try_get("tracking_number")?,
            shipped_at: row.try_get::<SqlxTimestamp, _>("shipped_at")?.to_jiff(),
            delivered_at: row
                .try_get::<Option<SqlxTimestamp>, _>("delivered_at")?
                .map(SqlxTimestamp::to_jiff),
        })
    }
}
