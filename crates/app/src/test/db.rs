//! Per-test PostgreSQL databases inside one shared container.

use std::time::{SystemTime, UNIX_EPOCH};

use once_cell::sync::Lazy;
use sqlx::{Connection, PgConnection, PgPool};
use testcontainers::{ContainerAsync, ImageExt, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres as PostgresImage;
use tokio::sync::{OnceCell, mpsc};

pub(super) const SUPERUSER: &str = "emporium_test";
pub(super) const SUPERUSER_PASSWORD: &str = "emporium_test_password";

const MAINTENANCE_DB: &str = "postgres";

/// Checks a generated database name before it is spliced into DDL.
///
/// Names are 1-63 characters, start with a letter or underscore and contain
/// only ASCII letters, digits, underscores and dollar signs.
fn validate_database_name(name: &str) -> Result<(), String> {
    if name.is_empty() || name.len() > 63 {
        return Err("database name must be 1-63 characters long".to_string());
    }

    let starts_well = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');

    if !starts_well {
        return Err("database name must start with a letter or underscore".to_string());
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
    {
        return Err(
            "database name may only contain letters, digits, underscores and dollar signs"
                .to_string(),
        );
    }

    Ok(())
}

async fn start_container() -> ContainerAsync<PostgresImage> {
    PostgresImage::default()
        .with_user(SUPERUSER)
        .with_password(SUPERUSER_PASSWORD)
        .with_db_name(SUPERUSER)
        .with_env_var("POSTGRES_INITDB_ARGS", "--auth-host=trust")
        .start()
        .await
        .expect("Failed to start PostgreSQL container")
}

static CONTAINER: Lazy<OnceCell<ContainerAsync<PostgresImage>>> = Lazy::new(OnceCell::new);

/// Databases waiting to be dropped by the background reaper.
static DROP_QUEUE: Lazy<OnceCell<mpsc::UnboundedSender<String>>> = Lazy::new(OnceCell::new);

async fn start_reaper() -> mpsc::UnboundedSender<String> {
    let (sender, mut receiver) = mpsc::unbounded_channel::<String>();

    tokio::spawn(async move {
        while let Some(name) = receiver.recv().await {
            if let Err(error) = drop_database(&name).await {
                eprintln!("Failed to drop test database '{name}': {error}");
            }
        }
    });

    sender
}

async fn server_url(database: &str) -> Option<String> {
    let port = CONTAINER.get()?.get_host_port_ipv4(5432).await.ok()?;

    let host =
        std::env::var("TESTCONTAINERS_HOST_OVERRIDE").unwrap_or_else(|_| "localhost".to_string());

    Some(format!(
        "postgresql://{SUPERUSER}:{SUPERUSER_PASSWORD}@{host}:{port}/{database}"
    ))
}

async fn drop_database(name: &str) -> Result<(), sqlx::Error> {
    if validate_database_name(name).is_err() {
        return Ok(());
    }

    let Some(url) = server_url(MAINTENANCE_DB).await else {
        return Ok(());
    };

    let mut conn = PgConnection::connect(&url).await?;

    sqlx::query(&format!("DROP DATABASE IF EXISTS \"{name}\""))
        .execute(&mut conn)
        .await?;

    conn.close().await
}

/// A migrated database owned by a single test.
///
/// Services commit normally; isolation comes from every test getting a fresh
/// database. The database is queued for dropping when the value goes away.
#[derive(Debug, Clone)]
pub struct TestDb {
    pool: PgPool,

    pub name: String,

    /// Superuser URL of this database, used to derive the app role URL.
    pub(super) superuser_url: String,
}

impl Drop for TestDb {
    fn drop(&mut self) {
        if let Some(sender) = DROP_QUEUE.get() {
            let _ = sender.send(self.name.clone());
        }
    }
}

impl TestDb {
    pub async fn new() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock before epoch")
            .as_nanos();

        let thread_id = std::thread::current().id();

        let name =
            format!("emporium_test_{nanos}_{thread_id:?}").replace([':', ' ', '(', ')'], "");

        Self::with_name(&name).await
    }

    pub async fn with_name(name: &str) -> Self {
        DROP_QUEUE.get_or_init(start_reaper).await;

        if let Err(error) = validate_database_name(name) {
            panic!("Invalid database name '{name}': {error}");
        }

        CONTAINER.get_or_init(start_container).await;

        let maintenance_url = server_url(MAINTENANCE_DB)
            .await
            .expect("Failed to resolve container address");

        let mut conn = PgConnection::connect(&maintenance_url)
            .await
            .expect("Failed to connect to maintenance database");

        sqlx::query(&format!("CREATE DATABASE \"{name}\""))
            .execute(&mut conn)
            .await
            .expect("Failed to create test database");

        conn.close()
            .await
            .expect("Failed to close maintenance connection");

        let superuser_url = server_url(name)
            .await
            .expect("Failed to resolve container address");

        let pool = PgPool::connect(&superuser_url)
            .await
            .expect("Failed to connect to test database");

        crate::database::migrate(&pool)
            .await
            .expect("Failed to run migrations");

        Self {
            pool,
            name: name.to_string(),
            superuser_url,
        }
    }

    /// Superuser pool; bypasses row-level security.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_generated_style_names() {
        assert!(validate_database_name("emporium_test_1712_ThreadId4").is_ok());
        assert!(validate_database_name("_leading_underscore").is_ok());
        assert!(validate_database_name("with$dollar").is_ok());
    }

    #[test]
    fn rejects_bad_names() {
        assert!(validate_database_name("").is_err());
        assert!(validate_database_name(&"a".repeat(64)).is_err());
        assert!(validate_database_name("9lives").is_err());
        assert!(validate_database_name("semi;colon").is_err());
        assert!(validate_database_name("quote\"d").is_err());
    }

    #[tokio::test]
    async fn migrations_create_business_tables() {
        let test_db = TestDb::new().await;

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT tablename::TEXT FROM pg_tables WHERE schemaname = 'public' ORDER BY 1",
        )
        .fetch_all(test_db.pool())
        .await
        .expect("Failed to list tables");

        for expected in ["orders", "order_lines", "prices", "products", "stocks", "tenants"] {
            assert!(
                tables.iter().any(|table| table == expected),
                "missing table {expected}"
            );
        }
    }
}
