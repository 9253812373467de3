//! Pool setup and schema migration
//!
//! The ledger keeps one `PgPool` per process. Reads borrow a pooled
//! connection per call; every unit of work holds one connection for the
//! lifetime of its database transaction, so `max_connections` bounds the
//! number of ledger operations that can be in flight at once.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

use crate::error::DatabaseError;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub type DatabasePool = PgPool;

/// Pool settings for the ledger database
///
/// ```rust
/// use std::time::Duration;
/// use infra_db::DatabaseConfig;
///
/// let config = DatabaseConfig::new("postgres://localhost/ledger")
///     .max_connections(20)
///     .idle_timeout(Duration::from_secs(120));
/// assert_eq!(config.max_connections, 20);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// Connections kept open while the ledger is idle
    pub min_connections: u32,
    /// How long a caller waits for a free connection
    pub connect_timeout: Duration,
    /// Connections older than this are recycled
    pub max_lifetime: Duration,
    /// Idle connections above `min_connections` are closed after this
    pub idle_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            min_connections: 2,
            connect_timeout: Duration::from_secs(30),
            max_lifetime: Duration::from_secs(30 * 60),
            idle_timeout: Duration::from_secs(10 * 60),
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn max_lifetime(mut self, lifetime: Duration) -> Self {
        self.max_lifetime = lifetime;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(self.connect_timeout)
            .max_lifetime(self.max_lifetime)
            .idle_timeout(self.idle_timeout)
    }
}

/// Opens the ledger pool
///
/// # Errors
///
/// `DatabaseError::ConnectionFailed` when the first connection cannot be
/// established.
pub async fn create_pool(config: DatabaseConfig) -> Result<DatabasePool, DatabaseError> {
    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        max_lifetime_secs = config.max_lifetime.as_secs(),
        idle_timeout_secs = config.idle_timeout.as_secs(),
        "Opening ledger database pool"
    );

    let pool = config
        .pool_options()
        .connect(&config.url)
        .await
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

    info!("Ledger database pool ready");
    Ok(pool)
}

/// Applies the embedded ledger schema migrations
///
/// # Errors
///
/// `DatabaseError::MigrationFailed` when a migration cannot be applied.
pub async fn run_migrations(pool: &DatabasePool) -> Result<(), DatabaseError> {
    info!("Running database migrations");
    MIGRATOR.run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides_each_setting() {
        let config = DatabaseConfig::new("postgres://test")
            .max_connections(50)
            .min_connections(10)
            .connect_timeout(Duration::from_secs(60))
            .max_lifetime(Duration::from_secs(900))
            .idle_timeout(Duration::from_secs(60));

        assert_eq!(config.max_connections, 50);
        assert_eq!(config.min_connections, 10);
        assert_eq!(config.connect_timeout, Duration::from_secs(60));
        assert_eq!(config.max_lifetime, Duration::from_secs(900));
        assert_eq!(config.idle_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_defaults_recycle_idle_connections_before_lifetime() {
        let config = DatabaseConfig::new("postgres://test");

        assert!(config.min_connections <= config.max_connections);
        assert!(config.idle_timeout < config.max_lifetime);
    }

    #[test]
    fn test_pool_options_carry_the_settings() {
        let options = DatabaseConfig::new("postgres://test")
            .max_connections(7)
            .min_connections(3)
            .pool_options();

        assert_eq!(options.get_max_connections(), 7);
        assert_eq!(options.get_min_connections(), 3);
    }

    #[test]
    fn test_migrations_are_embedded() {
        assert!(MIGRATOR.iter().count() >= 1);
    }
}
