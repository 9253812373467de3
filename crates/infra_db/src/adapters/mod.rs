//! Domain Adapters
//!
//! Implementations of the ledger ports on top of the repository layer. The
//! adapter translates between domain models and row types and maps database
//! errors onto [`core_kernel::PortError`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresLedgerStore;
//! use domain_ledger::LedgerStore;
//!
//! let store: Arc<dyn LedgerStore> = Arc::new(PostgresLedgerStore::new(pool));
//! let mut unit = store.begin().await?;
//! ```

pub mod ledger;

pub use ledger::{PgLedgerUnit, PostgresLedgerStore};
