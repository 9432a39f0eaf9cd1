//! Customers Repository

use sqlx::{Postgres, Transaction, query, query_scalar};

use crate::domain::{caller::AccountUuid, customers::data::NewCustomerProfile};

const GET_DEFAULT_SHIPPING_ADDRESS_SQL: &str =
    include_str!("sql/get_default_shipping_address.sql");
const UPSERT_PROFILE_SQL: &str = include_str!("sql/upsert_profile.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCustomersRepository;

impl PgCustomersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn get_default_shipping_address(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        customer: AccountUuid,
    ) -> Result<Option<String>, sqlx::Error> {
        let address: Option<Option<String>> =
            query_scalar::<Postgres, Option<String>>(GET_DEFAULT_SHIPPING_ADDRESS_SQL)
                .bind(customer.into_uuid())
                .fetch_optional(&mut **tx)
                .await?;

        Ok(address.flatten())
    }

    pub(crate) async fn upsert_profile(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        profile: &NewCustomerProfile,
    ) -> Result<(), sqlx::Error> {
        query(UPSERT_PROFILE_SQL)
            .bind(profile.account_uuid.into_uuid())
            .bind(profile.default_shipping_address.as_deref())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}
