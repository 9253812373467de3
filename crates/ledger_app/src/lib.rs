//! Stock Ledger Application
//!
//! Wires the ledger together for a running process:
//!
//! - **Configuration**: `LEDGER_*` environment variables with defaults
//! - **Telemetry**: `tracing-subscriber` with plain or JSON output
//! - **Context**: the engine, settlement processor, queries and debt
//!   aggregator built once over a shared store
//!
//! # Example
//!
//! ```rust,ignore
//! use ledger_app::{LedgerConfig, LedgerContext, telemetry};
//!
//! let config = LedgerConfig::from_env()?;
//! telemetry::init(&config)?;
//! let context = LedgerContext::connect(&config).await?;
//! let tx = context.engine.create_transaction(request).await?;
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod telemetry;

pub use config::{LedgerConfig, LogFormat};
pub use context::LedgerContext;
pub use error::AppError;
