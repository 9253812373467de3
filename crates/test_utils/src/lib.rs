//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! stock ledger test suite.
//!
//! # Modules
//!
//! - `fixtures`: Seeded in-memory ledgers and a pinned business clock
//! - `builders`: Builder for transaction requests
//! - `database`: PostgreSQL testcontainer management
//! - `assertions`: Ledger invariant and snapshot assertions
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
