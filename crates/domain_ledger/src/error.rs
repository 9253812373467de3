//! Ledger domain errors
//!
//! Callers receive one of a closed set of error kinds plus a message. The
//! kind is matched structurally through [`LedgerError::kind`].

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use core_kernel::{Money, MoneyError, PortError};

/// Classification of a ledger error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Customer, company, item, transaction or invoice does not exist
    NotFound,
    /// Malformed request or invalid field value
    Validation,
    /// The invoice is already settled
    Conflict,
    /// Outbound quantity cannot be satisfied from current stock
    InsufficientStock,
    /// Payment larger than the remaining total
    AmountExceedsTotal,
    /// Store or commit failure
    Internal,
}

/// Errors that can occur in the ledger domain
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A referenced entity does not exist
    #[error("{entity} not found: {key}")]
    NotFound {
        entity: String,
        key: String,
    },

    /// The request failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// The request conflicts with the current state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Outbound quantity must be strictly less than available stock
    #[error("Insufficient stock for {item}: requested {requested}, available {available}")]
    InsufficientStock {
        item: String,
        requested: Decimal,
        available: Decimal,
    },

    /// Payment would push cumulative credit past the transaction total
    #[error("Amount {amount} exceeds remaining total {remaining}")]
    AmountExceedsTotal {
        amount: Money,
        remaining: Money,
    },

    /// The store failed or the unit of work could not be committed
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Creates a NotFound error
    pub fn not_found(entity: impl Into<String>, key: impl std::fmt::Display) -> Self {
        LedgerError::NotFound {
            entity: entity.into(),
            key: key.to_string(),
        }
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        LedgerError::Validation(message.into())
    }

    /// Creates a Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        LedgerError::Conflict(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        LedgerError::Internal(message.into())
    }

    /// Returns the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::NotFound { .. } => ErrorKind::NotFound,
            LedgerError::Validation(_) => ErrorKind::Validation,
            LedgerError::Conflict(_) => ErrorKind::Conflict,
            LedgerError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            LedgerError::AmountExceedsTotal { .. } => ErrorKind::AmountExceedsTotal,
            LedgerError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Replaces the entity name of a NotFound error, leaving other errors untouched
    pub(crate) fn with_entity(self, entity: &str) -> Self {
        match self {
            LedgerError::NotFound { key, .. } => LedgerError::NotFound {
                entity: entity.to_string(),
                key,
            },
            other => other,
        }
    }
}

impl From<PortError> for LedgerError {
    fn from(error: PortError) -> Self {
        match error {
            PortError::NotFound { entity_type, id } => LedgerError::NotFound {
                entity: entity_type,
                key: id,
            },
            PortError::Validation { message } => LedgerError::Validation(message),
            PortError::Conflict { message } => LedgerError::Conflict(message),
            other => LedgerError::Internal(other.to_string()),
        }
    }
}

impl From<MoneyError> for LedgerError {
    fn from(error: MoneyError) -> Self {
        LedgerError::Validation(error.to_string())
    }
}

impl From<ValidationErrors> for LedgerError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{} is invalid", field),
                })
            })
            .collect();
        messages.sort();
        LedgerError::Validation(messages.join("; "))
    }
}
