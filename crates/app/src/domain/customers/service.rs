//! Customers service.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    database::Db,
    domain::{
        caller::AccountUuid,
        customers::{
            data::NewCustomerProfile, errors::CustomersServiceError,
            repository::PgCustomersRepository,
        },
        tenants::records::TenantUuid,
    },
};

#[derive(Debug, Clone)]
pub struct PgCustomersService {
    db: Db,
    repository: PgCustomersRepository,
}

impl PgCustomersService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgCustomersRepository::new(),
        }
    }
}

#[async_trait]
impl CustomersService for PgCustomersService {
    #[tracing::instrument(
        name = "customers.service.default_shipping_address",
        skip(self),
        fields(tenant_uuid = %tenant, customer_uuid = %customer),
        err
    )]
    async fn default_shipping_address(
        &self,
        tenant: TenantUuid,
        customer: AccountUuid,
    ) -> Result<Option<String>, CustomersServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let address = self
            .repository
            .get_default_shipping_address(&mut tx, customer)
            .await?;

        tx.commit().await?;

        Ok(address)
    }

    #[tracing::instrument(
        name = "customers.service.upsert_profile",
        skip(self, profile),
        fields(tenant_uuid = %tenant, customer_uuid = %profile.account_uuid),
        err
    )]
    async fn upsert_profile(
        &self,
        tenant: TenantUuid,
        profile: NewCustomerProfile,
    ) -> Result<(), CustomersServiceError> {
        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        self.repository.upsert_profile(&mut tx, &profile).await?;

        tx.commit().await?;

        Ok(())
    }
}

#[automock]
#[async_trait]
/// Customer profile lookups used by checkout.
pub trait CustomersService: Send + Sync {
    /// Stored default shipping address of a customer, if any.
    async fn default_shipping_address(
        &self,
        tenant: TenantUuid,
        customer: AccountUuid,
    ) -> Result<Option<String>, CustomersServiceError>;

    /// Create or replace a customer's profile.
    async fn upsert_profile(
        &self,
        tenant: TenantUuid,
        profile: NewCustomerProfile,
    ) -> Result<(), CustomersServiceError>;
}
