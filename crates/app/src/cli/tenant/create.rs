use clap::Args;
use emporium_app::{
    database,
    domain::tenants::{
        PgTenantsService, TenantsService, data::NewTenant, records::TenantUuid,
    },
};
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct CreateTenantArgs {
    /// Tenant display name
    #[arg(long)]
    name: String,

    /// Administrative PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Optional tenant UUID; generated when omitted
    #[arg(long)]
    tenant_uuid: Option<Uuid>,
}

pub(crate) async fn run(args: CreateTenantArgs) -> Result<(), String> {
    let pool = database::connect(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let tenant = PgTenantsService::new(pool)
        .create_tenant(NewTenant {
            uuid: args
                .tenant_uuid
                .map_or_else(TenantUuid::new, TenantUuid::from_uuid),
            name: args.name,
        })
        .await
        .map_err(|error| format!("failed to create tenant: {error}"))?;

    println!("tenant_uuid: {}", tenant.uuid);
    println!("tenant_name: {}", tenant.name);
    println!("export TENANT_UUID={} to target it", tenant.uuid);

    Ok(())
}
