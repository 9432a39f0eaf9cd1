//! Tenants service.

use async_trait::async_trait;
use mockall::automock;
use sqlx::PgPool;
use tracing::info;

use crate::domain::tenants::{
    data::NewTenant, errors::TenantsServiceError, records::TenantRecord,
    repository::PgTenantsRepository,
};

/// Tenant administration over an unrestricted pool.
#[derive(Debug, Clone)]
pub struct PgTenantsService {
    repository: PgTenantsRepository,
}

impl PgTenantsService {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: PgTenantsRepository::new(pool),
        }
    }
}

#[async_trait]
impl TenantsService for PgTenantsService {
    #[tracing::instrument(
        name = "tenants.service.create_tenant",
        skip(self, tenant),
        fields(tenant_uuid = %tenant.uuid),
        err
    )]
    async fn create_tenant(&self, tenant: NewTenant) -> Result<TenantRecord, TenantsServiceError> {
        if tenant.name.trim().is_empty() {
            return Err(TenantsServiceError::InvalidName);
        }

        let created = self.repository.create_tenant(&tenant).await?;

        info!(tenant_uuid = %created.uuid, name = %created.name, "registered tenant");

        Ok(created)
    }
}

#[automock]
#[async_trait]
pub trait TenantsService: Send + Sync {
    /// Register a tenant; its uuid becomes the row-level security key.
    async fn create_tenant(&self, tenant: NewTenant) -> Result<TenantRecord, TenantsServiceError>;
}
