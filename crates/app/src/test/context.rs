//! Service fixtures wired to a per-test database.

use std::sync::Arc;

use sqlx::{Connection, PgConnection, PgPool, query};

use crate::{
    database::Db,
    domain::{
        customers::{CustomersService, PgCustomersService},
        orders::PgOrdersService,
        products::PgProductsService,
        tenants::{
            PgTenantsService, TenantsService, data::NewTenant, records::TenantUuid,
        },
    },
};

use super::db::{SUPERUSER, SUPERUSER_PASSWORD, TestDb};

/// Login role without `BYPASSRLS`, shared by every test database.
const APP_ROLE: &str = "emporium_app_test";
const APP_ROLE_PASSWORD: &str = "emporium_app_test_password";

pub struct TestContext {
    pub db: TestDb,

    /// Pool of the restricted role, for wiring services with test doubles.
    pub app_db: Db,

    pub tenant_uuid: TenantUuid,
    pub products: PgProductsService,
    pub customers: PgCustomersService,
    pub orders: PgOrdersService,
}

impl TestContext {
    pub async fn new() -> Self {
        let test_db = TestDb::new().await;

        let app_db = Db::new(Self::connect_app_role(&test_db).await);

        let customers = PgCustomersService::new(app_db.clone());
        let orders = PgOrdersService::new(
            app_db.clone(),
            Arc::new(customers.clone()) as Arc<dyn CustomersService>,
        );

        let ctx = Self {
            tenant_uuid: TenantUuid::new(),
            products: PgProductsService::new(app_db.clone()),
            customers,
            orders,
            app_db,
            db: test_db,
        };

        ctx.insert_tenant(ctx.tenant_uuid, "Test Tenant").await;

        ctx
    }

    /// Create an additional tenant, e.g. for isolation tests.
    pub async fn create_tenant(&self, name: &str) -> TenantUuid {
        let uuid = TenantUuid::new();

        self.insert_tenant(uuid, name).await;

        uuid
    }

    async fn insert_tenant(&self, uuid: TenantUuid, name: &str) {
        PgTenantsService::new(self.db.pool().clone())
            .create_tenant(NewTenant {
                uuid,
                name: name.to_string(),
            })
            .await
            .expect("Failed to create test tenant");
    }

    /// Ensure the restricted role exists and can use this database, then
    /// connect as it.
    ///
    /// Superusers bypass row-level security even when it is forced, so
    /// services under test must not run as the container superuser.
    async fn connect_app_role(test_db: &TestDb) -> PgPool {
        let superuser_url = &test_db.superuser_url;

        let server_url = superuser_url
            .rsplit_once('/')
            .map_or(superuser_url.as_str(), |(server, _)| server);

        let mut server_conn = PgConnection::connect(&format!("{server_url}/postgres"))
            .await
            .expect("Failed to connect for role setup");

        let created = query(&format!(
            "CREATE ROLE {APP_ROLE} WITH LOGIN PASSWORD '{APP_ROLE_PASSWORD}' \
               NOSUPERUSER NOCREATEDB NOCREATEROLE NOBYPASSRLS"
        ))
        .execute(&mut server_conn)
        .await;

        // Parallel tests race to create the role; duplicate_object (42710) or
        // unique_violation (23505) both mean it now exists.
        match created {
            Ok(_) => {}
            Err(sqlx::Error::Database(ref error))
                if matches!(error.code().as_deref(), Some("42710" | "23505")) => {}
            Err(error) => panic!("Failed to create app role: {error}"),
        }

        query(&format!(
            "GRANT CONNECT ON DATABASE \"{}\" TO {APP_ROLE}",
            test_db.name
        ))
        .execute(&mut server_conn)
        .await
        .expect("Failed to grant CONNECT");

        server_conn
            .close()
            .await
            .expect("Failed to close server connection");

        let mut db_conn = PgConnection::connect(superuser_url)
            .await
            .expect("Failed to connect for privilege setup");

        for statement in [
            format!("GRANT USAGE ON SCHEMA public TO {APP_ROLE}"),
            format!(
                "GRANT SELECT, INSERT, UPDATE, DELETE ON ALL TABLES IN SCHEMA public TO {APP_ROLE}"
            ),
        ] {
            query(&statement)
                .execute(&mut db_conn)
                .await
                .expect("Failed to grant privileges");
        }

        db_conn
            .close()
            .await
            .expect("Failed to close database connection");

        let app_url = superuser_url.replacen(
            &format!("{SUPERUSER}:{SUPERUSER_PASSWORD}"),
            &format!("{APP_ROLE}:{APP_ROLE_PASSWORD}"),
            1,
        );

        PgPool::connect(&app_url)
            .await
            .expect("Failed to connect as app role")
    }
}
