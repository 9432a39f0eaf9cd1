//! Stock Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use tracing::debug;

use crate::{
    domain::{
        products::records::ProductUuid,
        stock::{records::StockRecord, reservation::StockAdjustment},
    },
    uuids::into_uuids,
};

const LOCK_STOCKS_SQL: &str = include_str!("sql/lock_stocks.sql");
const RESERVE_STOCK_SQL: &str = include_str!("sql/reserve_stock.sql");
const RELEASE_STOCK_SQL: &str = include_str!("sql/release_stock.sql");
const CREATE_STOCK_SQL: &str = include_str!("sql/create_stock.sql");
const SET_STOCK_SQL: &str = include_str!("sql/set_stock.sql");

const COLUMN_QUANTITY_AVAILABLE: &str = "quantity_available";

#[derive(Debug, Clone, Default)]
pub(crate) struct PgStockRepository;

impl PgStockRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Lock the stock rows of `products` until the transaction ends.
    ///
    /// Rows are locked in ascending product order so concurrent orders over
    /// overlapping products queue instead of deadlocking.
    #[tracing::instrument(
        name = "stock.repository.lock_stocks",
        skip(self, tx, products),
        fields(product_count = products.len()),
        err
    )]
    pub(crate) async fn lock_stocks(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        products: &[ProductUuid],
    ) -> Result<Vec<StockRecord>, sqlx::Error> {
        query_as::<Postgres, StockRecord>(LOCK_STOCKS_SQL)
            .bind(into_uuids(products))
            .fetch_all(&mut **tx)
            .await
    }

    /// Guarded decrement; affects no rows if the level dropped below the
    /// reserved quantity since it was read.
    pub(crate) async fn reserve_stock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        adjustment: &StockAdjustment,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(RESERVE_STOCK_SQL)
            .bind(adjustment.product_uuid.into_uuid())
            .bind(quantity_to_i32(adjustment.quantity, COLUMN_QUANTITY_AVAILABLE)?)
            .bind(SqlxTimestamp::from(adjustment.last_updated_at))
            .execute(&mut **tx)
            .await?
            .rows_affected();

        debug!(
            product_uuid = %adjustment.product_uuid,
            quantity = adjustment.quantity,
            rows_affected,
            "reserved stock"
        );

        Ok(rows_affected)
    }

    pub(crate) async fn release_stock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        adjustment: &StockAdjustment,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(RELEASE_STOCK_SQL)
            .bind(adjustment.product_uuid.into_uuid())
            .bind(quantity_to_i32(adjustment.quantity, COLUMN_QUANTITY_AVAILABLE)?)
            .bind(SqlxTimestamp::from(adjustment.last_updated_at))
            .execute(&mut **tx)
            .await?
            .rows_affected();

        debug!(
            product_uuid = %adjustment.product_uuid,
            quantity = adjustment.quantity,
            rows_affected,
            "released stock"
        );

        Ok(rows_affected)
    }

    pub(crate) async fn create_stock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<StockRecord, sqlx::Error> {
        query_as::<Postgres, StockRecord>(CREATE_STOCK_SQL)
            .bind(product.into_uuid())
            .bind(quantity_to_i32(quantity, COLUMN_QUANTITY_AVAILABLE)?)
            .fetch_one(&mut **tx)
            .await
    }

    /// Absolute set, as done by suppliers restocking.
    pub(crate) async fn set_stock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<StockRecord, sqlx::Error> {
        query_as::<Postgres, StockRecord>(SET_STOCK_SQL)
            .bind(product.into_uuid())
            .bind(quantity_to_i32(quantity, COLUMN_QUANTITY_AVAILABLE)?)
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for StockRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            product_uuid: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            quantity_available: try_get_quantity(row, COLUMN_QUANTITY_AVAILABLE)?,
            last_updated_at: row
                .try_get::<SqlxTimestamp, _>("last_updated_at")?
                .to_jiff(),
        })
    }
}

pub(crate) fn try_get_quantity(row: &PgRow, col: &str) -> Result<u32, sqlx::Error> {
    let quantity_i32: i32 = row.try_get(col)?;

    u32::try_from(quantity_i32).map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}

pub(crate) fn quantity_to_i32(value: u32, column: &'static str) -> Result<i32, sqlx::Error> {
    i32::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}
