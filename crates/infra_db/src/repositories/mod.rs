//! Repository implementations for ledger tables
//!
//! Each repository is a set of queries over a `&mut PgConnection`, which is
//! either a pooled connection or the connection behind an open transaction.
//! Repositories speak in row types; the adapter layer converts them to
//! domain types.
//!
//! Queries are checked at runtime (`query_as` with `FromRow` rows) so the
//! crate builds without a live database.

pub mod party;
pub mod inventory;
pub mod transaction;
pub mod payment;

pub use party::{CompanyRow, CustomerRow};
pub use inventory::InventoryItemRow;
pub use transaction::{DbPaymentStatus, TransactionDetailRow, TransactionHeaderRow, TxDirection};
pub use payment::{CreditPaymentRow, ExpenditureRow};
