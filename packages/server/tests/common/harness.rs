//! Test harness with testcontainers for integration testing.
//!
//! One shared Postgres container for the whole test run; every test gets its
//! own freshly migrated database inside it, so tests are fully isolated and
//! safe to run in parallel.

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

/// Shared container that persists across all tests in the run.
struct SharedTestInfra {
    host: String,
    port: u16,
    _postgres: ContainerAsync<Postgres>,
}

static SHARED_INFRA: OnceCell<SharedTestInfra> = OnceCell::const_new();

impl SharedTestInfra {
    async fn init() -> Result<Self> {
        // Respect RUST_LOG when tests are run with --nocapture.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let postgres = Postgres::default()
            .with_tag("16")
            .with_cmd(["-c", "max_connections=200"])
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let host = postgres.get_host().await?.to_string();
        let port = postgres.get_host_port_ipv4(5432).await?;

        Ok(Self {
            host,
            port,
            _postgres: postgres,
        })
    }

    async fn get() -> &'static Self {
        SHARED_INFRA
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared test infrastructure")
            })
            .await
    }

    fn url(&self, database: &str) -> String {
        format!(
            "postgresql://postgres:postgres@{}:{}/{}",
            self.host, self.port, database
        )
    }
}

/// Per-test context: a dedicated, migrated database in the shared container.
pub struct TestHarness {
    pub db_pool: PgPool,
    db_name: String,
}

impl TestHarness {
    async fn create() -> Result<Self> {
        let infra = SharedTestInfra::get().await;

        let db_name = format!("test_{}", Uuid::new_v4().simple());
        let admin_pool = PgPool::connect(&infra.url("postgres"))
            .await
            .context("Failed to connect to admin database")?;
        sqlx::query(&format!("CREATE DATABASE {}", db_name))
            .execute(&admin_pool)
            .await
            .context("Failed to create test database")?;
        admin_pool.close().await;

        let db_pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(&infra.url(&db_name))
            .await
            .context("Failed to connect to test database")?;

        sqlx::migrate!("./migrations")
            .run(&db_pool)
            .await
            .context("Failed to run migrations")?;

        Ok(Self { db_pool, db_name })
    }

    async fn destroy(self) {
        self.db_pool.close().await;

        let infra = SharedTestInfra::get().await;
        if let Ok(admin_pool) = PgPool::connect(&infra.url("postgres")).await {
            let _ = sqlx::query(&format!(
                "DROP DATABASE IF EXISTS {} WITH (FORCE)",
                self.db_name
            ))
            .execute(&admin_pool)
            .await;
            admin_pool.close().await;
        }
    }
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        TestHarness::create()
            .await
            .expect("Failed to set up test harness")
    }

    async fn teardown(self) {
        self.destroy().await;
    }
}
