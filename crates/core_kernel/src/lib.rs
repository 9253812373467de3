//! Core Kernel - Foundational types shared by the stock ledger crates
//!
//! This crate provides the building blocks used across the workspace:
//! - `Money` with exact decimal arithmetic for a single-currency business
//! - A business `Clock` that knows which calendar day it is locally
//! - Strongly-typed identifiers
//! - The port vocabulary (`PortError`, `DomainPort`) shared by adapters

pub mod money;
pub mod clock;
pub mod identifiers;
pub mod ports;
pub mod error;

pub use money::{Money, MoneyError};
pub use clock::{Clock, BusinessClock, FixedClock};
pub use identifiers::{
    CustomerId, CompanyId, ItemId, TransactionId, LineItemId,
    CreditPaymentId, ExpenditureId,
};
pub use ports::{PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth};
pub use error::CoreError;
