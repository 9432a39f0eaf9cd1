//! Connection, tenant and caller options shared by storefront commands.

use clap::{Args, ValueEnum};
use emporium_app::{
    context::AppContext,
    domain::{
        caller::{AccountUuid, CallerContext, Role},
        tenants::records::TenantUuid,
    },
};
use tracing::debug;
use uuid::Uuid;

/// Role to act as.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum CallerRole {
    Anonymous,
    Customer,
    Supplier,
    Employee,
    Administrator,
}

#[derive(Debug, Args)]
pub(crate) struct SessionArgs {
    /// PostgreSQL connection string, as the RLS-enforced app role
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Tenant to operate on
    #[arg(long, env = "TENANT_UUID")]
    tenant_uuid: Uuid,

    /// Role of the caller
    #[arg(long, value_enum, default_value_t = CallerRole::Anonymous)]
    role: CallerRole,

    /// Account UUID of the caller
    #[arg(long)]
    caller_uuid: Option<Uuid>,
}

impl SessionArgs {
    pub(crate) fn tenant(&self) -> TenantUuid {
        TenantUuid::from_uuid(self.tenant_uuid)
    }

    pub(crate) fn caller(&self) -> CallerContext {
        let identity = self.caller_uuid.map(AccountUuid::from_uuid);

        let role = match self.role {
            CallerRole::Anonymous => return CallerContext::anonymous(),
            CallerRole::Customer => Role::Customer,
            CallerRole::Supplier => Role::Supplier,
            CallerRole::Employee => Role::Employee,
            CallerRole::Administrator => Role::Administrator,
        };

        debug!(
            role = role.as_str(),
            caller_uuid = ?identity.map(|account| account.to_string()),
            "resolved caller"
        );

        CallerContext::new([role], identity)
    }

    pub(crate) async fn connect(&self) -> Result<AppContext, String> {
        AppContext::from_database_url(&self.database_url)
            .await
            .map_err(|error| format!("failed to connect to database: {error}"))
    }
}
