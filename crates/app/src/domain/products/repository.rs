//! Products Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use rust_decimal::Decimal;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use tracing::debug;
use uuid::Uuid;

use crate::{
    domain::{
        caller::AccountUuid,
        products::{
            data::{NewProduct, ProductQuery, ProductUpdate},
            records::{
                CategoryUuid, PriceRecord, PriceUuid, ProductRecord, ProductStatus, ProductUuid,
            },
            visibility::Visibility,
        },
        stock::repository::try_get_quantity,
    },
    uuids::into_uuids,
};

const LIST_PRODUCTS_SQL: &str = include_str!("sql/list_products.sql");
const GET_PRODUCT_SQL: &str = include_str!("sql/get_product.sql");
const FIND_PRODUCTS_SQL: &str = include_str!("sql/find_products.sql");
const FIND_CURRENT_PRICES_SQL: &str = include_str!("sql/find_current_prices.sql");
const CREATE_PRODUCT_SQL: &str = include_str!("sql/create_product.sql");
const CREATE_PRICE_SQL: &str = include_str!("sql/create_price.sql");
const UPDATE_PRODUCT_SQL: &str = include_str!("sql/update_product.sql");
const REVIEW_PRODUCT_SQL: &str = include_str!("sql/review_product.sql");
const SET_SUSPENDED_SQL: &str = include_str!("sql/set_suspended.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgProductsRepository;

impl PgProductsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn list_products(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product_query: &ProductQuery,
    ) -> Result<Vec<ProductRecord>, sqlx::Error> {
        let (unrestricted, owner) = product_query.visibility.sql_binds();

        query_as::<Postgres, ProductRecord>(LIST_PRODUCTS_SQL)
            .bind(unrestricted)
            .bind(owner)
            .bind(product_query.featured_only)
            .bind(i64::from(product_query.limit))
            .bind(i64::from(product_query.offset))
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn get_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        visibility: Visibility,
    ) -> Result<ProductRecord, sqlx::Error> {
        let (unrestricted, owner) = visibility.sql_binds();

        query_as::<Postgres, ProductRecord>(GET_PRODUCT_SQL)
            .bind(unrestricted)
            .bind(owner)
            .bind(product.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Batch load regardless of visibility; callers apply their own rules.
    pub(crate) async fn find_products(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        products: &[ProductUuid],
    ) -> Result<Vec<ProductRecord>, sqlx::Error> {
        query_as::<Postgres, ProductRecord>(FIND_PRODUCTS_SQL)
            .bind(into_uuids(products))
            .fetch_all(&mut **tx)
            .await
    }

    /// Every price row flagged current for `products`.
    pub(crate) async fn find_current_prices(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        products: &[ProductUuid],
    ) -> Result<Vec<PriceRecord>, sqlx::Error> {
        query_as::<Postgres, PriceRecord>(FIND_CURRENT_PRICES_SQL)
            .bind(into_uuids(products))
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn create_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        supplier: AccountUuid,
        product: &NewProduct,
    ) -> Result<ProductUuid, sqlx::Error> {
        let created: Uuid = sqlx::query_scalar(CREATE_PRODUCT_SQL)
            .bind(product.uuid.into_uuid())
            .bind(supplier.into_uuid())
            .bind(product.category_uuid.map(CategoryUuid::into_uuid))
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.is_listing_only)
            .fetch_one(&mut **tx)
            .await?;

        debug!(product_uuid = %created, supplier_uuid = %supplier, "created product");

        Ok(ProductUuid::from_uuid(created))
    }

    pub(crate) async fn create_price(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        base_price: Decimal,
        markup_percentage: Decimal,
        final_price: Decimal,
    ) -> Result<PriceRecord, sqlx::Error> {
        query_as::<Postgres, PriceRecord>(CREATE_PRICE_SQL)
            .bind(PriceUuid::new().into_uuid())
            .bind(product.into_uuid())
            .bind(base_price)
            .bind(markup_percentage)
            .bind(final_price)
            .fetch_one(&mut **tx)
            .await
    }

    /// Apply supplier edits; the product goes back to moderation.
    pub(crate) async fn update_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        update: &ProductUpdate,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(UPDATE_PRODUCT_SQL)
            .bind(product.into_uuid())
            .bind(&update.name)
            .bind(&update.description)
            .bind(update.category_uuid.map(CategoryUuid::into_uuid))
            .bind(update.is_listing_only)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn review_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        status: ProductStatus,
        is_active: bool,
        is_featured: bool,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(REVIEW_PRODUCT_SQL)
            .bind(product.into_uuid())
            .bind(status.as_str())
            .bind(is_active)
            .bind(is_featured)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn set_suspended(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        suspended: bool,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(SET_SUSPENDED_SQL)
            .bind(product.into_uuid())
            .bind(suspended)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for ProductRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let status: String = row.try_get("status")?;

        let status =
            ProductStatus::try_from(status.as_str()).map_err(|e| sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: e.into(),
            })?;

        Ok(Self {
            uuid: ProductUuid::from_uuid(row.try_get("uuid")?),
            supplier_uuid: AccountUuid::from_uuid(row.try_get("supplier_uuid")?),
            category_uuid: row
                .try_get::<Option<Uuid>, _>("category_uuid")?
                .map(CategoryUuid::from_uuid),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            status,
            is_active: row.try_get("is_active")?,
            is_featured: row.try_get("is_featured")?,
            is_listing_only: row.try_get("is_listing_only")?,
            is_suspended_by_supplier: row.try_get("is_suspended_by_supplier")?,
            current_price: row.try_get("current_price")?,
            quantity_available: try_get_quantity(row, "quantity_available")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for PriceRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: PriceUuid::from_uuid(row.try_get("uuid")?),
            product_uuid: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            base_price: row.try_get("base_price")?,
            markup_percentage: row.try_get("markup_percentage")?,
            final_price: row.try_get("final_price")?,
            is_current: row.try_get("is_current")?,
            valid_from: row
                .try_get::<Option<SqlxTimestamp>, _>("valid_from")?
                .map(SqlxTimestamp::to_jiff),
            valid_to: row
                .try_get::<Option<SqlxTimestamp>, _>("valid_to")?
                .map(SqlxTimestamp::to_jiff),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
