//! Database Test Utilities
//!
//! Starts a PostgreSQL testcontainer with the ledger migrations applied and
//! seeds counterparties and inventory through the repository layer.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use testcontainers::{
    core::{IntoContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};
use tokio::sync::OnceCell;

use core_kernel::Money;
use domain_ledger::{Company, Customer, InventoryItem};
use infra_db::repositories::{party, inventory, CompanyRow, CustomerRow, InventoryItemRow};
use infra_db::{run_migrations, PostgresLedgerStore};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const POSTGRES_IMAGE: &str = "postgres";
const POSTGRES_TAG: &str = "16-alpine";
const POSTGRES_USER: &str = "test_user";
const POSTGRES_PASSWORD: &str = "test_password";
const POSTGRES_DB: &str = "ledger_test";

/// Tables in dependency order, children first
const LEDGER_TABLES: &[&str] = &[
    "daily_expenditures",
    "credit_payments",
    "transaction_details",
    "transaction_headers",
    "inventory_items",
    "customers",
    "companies",
];

/// Configuration for test database
#[derive(Debug, Clone)]
pub struct TestDatabaseConfig {
    pub user: String,
    pub password: String,
    pub database: String,
    pub host: String,
    pub port: u16,
}

impl Default for TestDatabaseConfig {
    fn default() -> Self {
        Self {
            user: POSTGRES_USER.to_string(),
            password: POSTGRES_PASSWORD.to_string(),
            database: POSTGRES_DB.to_string(),
            host: "localhost".to_string(),
            port: 5432,
        }
    }
}

impl TestDatabaseConfig {
    /// Creates the database connection URL
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

/// A migrated PostgreSQL test container
pub struct TestDatabase {
    _container: ContainerAsync<GenericImage>,
    pub config: TestDatabaseConfig,
    pub pool: PgPool,
}

impl TestDatabase {
    /// Starts a container and applies the ledger migrations
    pub async fn new() -> Result<Self, BoxError> {
        let container = GenericImage::new(POSTGRES_IMAGE, POSTGRES_TAG)
            .with_exposed_port(5432.tcp())
            .with_wait_for(WaitFor::message_on_stderr(
                "database system is ready to accept connections",
            ))
            .with_env_var("POSTGRES_USER", POSTGRES_USER)
            .with_env_var("POSTGRES_PASSWORD", POSTGRES_PASSWORD)
            .with_env_var("POSTGRES_DB", POSTGRES_DB)
            .start()
            .await?;

        let port = container.get_host_port_ipv4(5432).await?;
        let host = container.get_host().await?.to_string();

        let config = TestDatabaseConfig {
            host,
            port,
            ..TestDatabaseConfig::default()
        };

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&config.connection_url())
            .await?;

        run_migrations(&pool).await?;

        Ok(Self {
            _container: container,
            config,
            pool,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// A ledger store over this database
    pub fn store(&self) -> PostgresLedgerStore {
        PostgresLedgerStore::new(self.pool.clone())
    }

    /// Clears all ledger data while preserving the schema
    pub async fn clear_data(&self) -> Result<(), BoxError> {
        sqlx::query(&format!("TRUNCATE TABLE {} CASCADE", LEDGER_TABLES.join(", ")))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Inserts a company and one of its customers
    pub async fn seed_counterparty(&self, company: &Company, customer: &Customer) -> Result<(), BoxError> {
        let mut conn = self.pool.acquire().await?;
        party::insert_company(
            &mut conn,
            &CompanyRow {
                id: company.id.into(),
                company_name: company.company_name.clone(),
                address: company.address.clone(),
                email: company.email.clone(),
                phone_number: company.phone_number.clone(),
                is_active: company.is_active,
            },
        )
        .await?;
        party::insert_customer(
            &mut conn,
            &CustomerRow {
                id: customer.id.into(),
                company_id: customer.company_id.into(),
                full_name: customer.full_name.clone(),
                address: customer.address.clone(),
                phone_number: customer.phone_number.clone(),
                debt: customer.debt.amount(),
            },
        )
        .await?;
        Ok(())
    }

    /// Inserts an active inventory item priced at 10
    pub async fn seed_item(&self, name: &str, stock: Decimal) -> Result<InventoryItem, BoxError> {
        let item = InventoryItem::new(name, Money::new(Decimal::TEN), stock, Utc::now());
        let mut conn = self.pool.acquire().await?;
        inventory::insert_item(
            &mut conn,
            &InventoryItemRow {
                id: item.id.into(),
                name: item.name.clone(),
                price: item.price.amount(),
                stock: item.stock,
                is_active: item.is_active,
                created_at: item.created_at,
                updated_at: item.updated_at,
            },
        )
        .await?;
        Ok(item)
    }
}

/// Global test database shared by a test binary
static SHARED_TEST_DB: OnceCell<Arc<TestDatabase>> = OnceCell::const_new();

/// Gets or creates the shared test database
///
/// # Panics
///
/// Panics if the container fails to start
pub async fn get_shared_test_database() -> Arc<TestDatabase> {
    SHARED_TEST_DB
        .get_or_init(|| async {
            Arc::new(
                TestDatabase::new()
                    .await
                    .expect("Failed to create shared test database"),
            )
        })
        .await
        .clone()
}

/// Creates an isolated test database for a single test
pub async fn create_isolated_test_database() -> Result<TestDatabase, BoxError> {
    TestDatabase::new().await
}
