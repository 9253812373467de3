//! Infrastructure Database Layer
//!
//! This crate persists the stock ledger in PostgreSQL using SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern. Repositories are thin sets of
//! queries over a `PgConnection`, so the same query runs against a pooled
//! connection or inside an open transaction. The [`PostgresLedgerStore`]
//! adapter implements the ledger ports on top of them, and its unit of work
//! wraps a single database transaction.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{DatabaseConfig, create_pool, run_migrations, PostgresLedgerStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/ledger")).await?;
//! run_migrations(&pool).await?;
//! let store = PostgresLedgerStore::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{DatabasePool, create_pool, run_migrations, DatabaseConfig};
pub use error::DatabaseError;
pub use adapters::PostgresLedgerStore;
