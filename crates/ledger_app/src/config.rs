//! Application configuration
//!
//! Every setting has a default and can be overridden with a `LEDGER_`
//! prefixed environment variable, e.g. `LEDGER_DATABASE_URL` or
//! `LEDGER_BUSINESS_TIMEZONE`.

use std::collections::HashMap;
use std::time::Duration;

use config::{Config, Environment};
use serde::Deserialize;
use validator::{Validate, ValidationError};

use core_kernel::{BusinessClock, CoreError};
use infra_db::DatabaseConfig;

use crate::error::AppError;

const ENV_PREFIX: &str = "LEDGER";

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Process configuration
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_pool_bounds"))]
pub struct LedgerConfig {
    /// PostgreSQL connection string
    #[validate(length(min = 1, message = "database url is required"))]
    pub database_url: String,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub max_connections: u32,
    pub min_connections: u32,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub connect_timeout_secs: u64,
    /// Pooled connections are recycled after this many seconds
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub max_lifetime_secs: u64,
    /// Surplus idle connections are closed after this many seconds
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub idle_timeout_secs: u64,
    /// `EnvFilter` directive, e.g. `info` or `domain_ledger=debug`
    pub log_level: String,
    pub log_format: LogFormat,
    /// IANA timezone that decides the business date
    pub business_timezone: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/ledger".to_string(),
            max_connections: 10,
            min_connections: 2,
            connect_timeout_secs: 30,
            max_lifetime_secs: 1800,
            idle_timeout_secs: 600,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            business_timezone: "Asia/Jakarta".to_string(),
        }
    }
}

impl LedgerConfig {
    /// Loads configuration from the process environment
    pub fn from_env() -> Result<Self, AppError> {
        Self::load(Environment::with_prefix(ENV_PREFIX))
    }

    /// Loads configuration from an explicit set of `LEDGER_*` variables
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, AppError> {
        Self::load(Environment::with_prefix(ENV_PREFIX).source(Some(vars)))
    }

    fn load(environment: Environment) -> Result<Self, AppError> {
        let defaults = Self::default();
        let config: LedgerConfig = Config::builder()
            .set_default("database_url", defaults.database_url)?
            .set_default("max_connections", i64::from(defaults.max_connections))?
            .set_default("min_connections", i64::from(defaults.min_connections))?
            .set_default("connect_timeout_secs", defaults.connect_timeout_secs as i64)?
            .set_default("max_lifetime_secs", defaults.max_lifetime_secs as i64)?
            .set_default("idle_timeout_secs", defaults.idle_timeout_secs as i64)?
            .set_default("log_level", defaults.log_level)?
            .set_default("log_format", "pretty")?
            .set_default("business_timezone", defaults.business_timezone)?
            .add_source(environment.try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Pool settings for `infra_db`
    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig::new(self.database_url.clone())
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .max_lifetime(Duration::from_secs(self.max_lifetime_secs))
            .idle_timeout(Duration::from_secs(self.idle_timeout_secs))
    }

    /// Wall clock in the business timezone
    pub fn clock(&self) -> Result<BusinessClock, CoreError> {
        BusinessClock::from_name(&self.business_timezone)
    }
}

fn validate_pool_bounds(config: &LedgerConfig) -> Result<(), ValidationError> {
    if config.min_connections > config.max_connections {
        let mut error = ValidationError::new("pool_bounds");
        error.message = Some("min_connections exceeds max_connections".into());
        return Err(error);
    }
    if config.idle_timeout_secs > config.max_lifetime_secs {
        let mut error = ValidationError::new("pool_timeouts");
        error.message = Some("idle_timeout_secs exceeds max_lifetime_secs".into());
        return Err(error);
    }
    Ok(())
}
