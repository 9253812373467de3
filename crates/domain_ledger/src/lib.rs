//! Stock Ledger Domain
//!
//! This crate records inbound and outbound stock movements as financial
//! transactions and settles them with installment-style credit payments.
//!
//! # Components
//!
//! - **Ledger Engine** (`engine`): validates a transaction request, adjusts
//!   inventory, computes totals, determines payment status and debt, and
//!   records the opening credit payment. It also voids transactions,
//!   releasing whatever debt they still carried.
//! - **Settlement Processor** (`settlement`): applies a payment against an
//!   open invoice and marks it settled once fully covered.
//! - **Customer Debt Aggregator** (`debt`): the single code path that
//!   writes a customer's running debt.
//! - **Queries** (`queries`): read-only access to transactions, payment
//!   history and stock movement.
//!
//! Every mutating operation runs inside one `LedgerUnit` obtained from a
//! `LedgerStore`; either all of its writes commit or none do.
//!
//! # Invariants
//!
//! After every committed operation:
//! - a transaction's total equals the sum of its line totals
//! - outbound stock never goes negative
//! - credit applied to an invoice never exceeds its total, and equality
//!   means the invoice is paid
//! - payment status only ever moves from unpaid to paid
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_ledger::{LedgerEngine, SettlementProcessor, CreateTransactionRequest};
//!
//! let engine = LedgerEngine::new(store.clone(), clock.clone());
//! let transaction = engine.create_transaction(request).await?;
//!
//! let settlement = SettlementProcessor::new(store, clock);
//! let receipt = settlement
//!     .apply_credit_payment(&transaction.invoice_number, dec!(60), "cashier")
//!     .await?;
//! ```

pub mod transaction;
pub mod inventory;
pub mod party;
pub mod payment;
pub mod expenditure;
pub mod invoice;
pub mod request;
pub mod error;
pub mod ports;
pub mod memory;
pub mod debt;
pub mod engine;
pub mod settlement;
pub mod queries;
mod unit;

pub use transaction::{Transaction, LineItem, Direction, PaymentStatus, CustomerSnapshot, OpeningBalance};
pub use inventory::{InventoryItem, StockMovement};
pub use party::{Customer, Company};
pub use payment::{CreditPayment, CreditPaymentReceipt, installment_note};
pub use expenditure::ExpenditureEntry;
pub use invoice::InvoiceNumber;
pub use request::{CreateTransactionRequest, LineRequest};
pub use error::{LedgerError, ErrorKind};
pub use ports::{LedgerReader, LedgerStore, LedgerUnit, StockDecrement, Page};
pub use memory::{InMemoryLedgerStore, LedgerState, FailurePoint};
pub use debt::{CustomerDebtAggregator, DebtReconciliation};
pub use engine::LedgerEngine;
pub use settlement::{SettlementProcessor, SettlementOutcome};
pub use queries::LedgerQueries;
