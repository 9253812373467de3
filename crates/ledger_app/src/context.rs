//! Component graph
//!
//! Every service is built once over one shared store and handed out by
//! `Arc`, so callers never construct their own collaborators.

use std::sync::Arc;

use tracing::info;

use core_kernel::{Clock, HealthCheckResult};
use domain_ledger::{
    CustomerDebtAggregator, LedgerEngine, LedgerQueries, LedgerStore, SettlementProcessor,
};
use infra_db::{create_pool, run_migrations, PostgresLedgerStore};

use crate::config::LedgerConfig;
use crate::error::AppError;

/// The wired ledger services
#[derive(Clone)]
pub struct LedgerContext {
    pub store: Arc<dyn LedgerStore>,
    pub engine: Arc<LedgerEngine>,
    pub settlement: Arc<SettlementProcessor>,
    pub queries: Arc<LedgerQueries>,
    pub debts: Arc<CustomerDebtAggregator>,
}

impl LedgerContext {
    /// Builds every service over `store` with `clock` deciding the business date
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            engine: Arc::new(LedgerEngine::new(store.clone(), clock.clone())),
            settlement: Arc::new(SettlementProcessor::new(store.clone(), clock)),
            queries: Arc::new(LedgerQueries::new(store.clone())),
            debts: Arc::new(CustomerDebtAggregator::new(store.clone())),
            store,
        }
    }

    /// Connects to PostgreSQL, applies migrations and builds the services
    pub async fn connect(config: &LedgerConfig) -> Result<Self, AppError> {
        let clock = config.clock()?;
        let pool = create_pool(config.database()).await?;
        run_migrations(&pool).await?;

        info!(timezone = %config.business_timezone, "Ledger context ready");
        Ok(Self::new(
            Arc::new(PostgresLedgerStore::new(pool)),
            Arc::new(clock),
        ))
    }

    pub async fn health_check(&self) -> HealthCheckResult {
        self.store.health_check().await
    }
}

impl std::fmt::Debug for LedgerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerContext")
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}
