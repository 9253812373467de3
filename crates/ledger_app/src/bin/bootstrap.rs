//! Stock Ledger - Bootstrap Binary
//!
//! Loads configuration, initialises tracing, applies schema migrations and
//! verifies the store is reachable.
//!
//! # Usage
//!
//! ```bash
//! LEDGER_DATABASE_URL=postgres://localhost/ledger cargo run --bin ledger-bootstrap
//! ```
//!
//! # Environment Variables
//!
//! * `LEDGER_DATABASE_URL` - PostgreSQL connection string
//! * `LEDGER_MAX_CONNECTIONS` / `LEDGER_MIN_CONNECTIONS` - pool bounds (default: 10 / 2)
//! * `LEDGER_CONNECT_TIMEOUT_SECS` - connection timeout (default: 30)
//! * `LEDGER_MAX_LIFETIME_SECS` - recycle pooled connections after (default: 1800)
//! * `LEDGER_IDLE_TIMEOUT_SECS` - close surplus idle connections after (default: 600)
//! * `LEDGER_LOG_LEVEL` - log filter (default: info)
//! * `LEDGER_LOG_FORMAT` - `pretty` or `json` (default: pretty)
//! * `LEDGER_BUSINESS_TIMEZONE` - IANA timezone for business dates (default: Asia/Jakarta)

use anyhow::{bail, Context};
use tracing::info;

use ledger_app::{telemetry, LedgerConfig, LedgerContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = LedgerConfig::from_env().context("loading configuration")?;
    telemetry::init(&config)?;

    info!(
        timezone = %config.business_timezone,
        max_connections = config.max_connections,
        "Bootstrapping stock ledger"
    );

    let context = LedgerContext::connect(&config)
        .await
        .context("connecting to the ledger database")?;

    let health = context.health_check().await;
    if !health.is_healthy() {
        bail!(
            "store {} is unhealthy: {}",
            health.adapter_id,
            health.message.unwrap_or_default()
        );
    }

    info!(latency_ms = health.latency_ms, "Ledger store healthy");
    Ok(())
}
