//! Error types for the SmallBank ledger.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::AccountId;

/// Broad category of a ledger error, used by transports to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or missing input.
    Validation,
    /// A referenced account does not exist.
    NotFound,
    /// Origin balance is lower than the requested amount.
    InsufficientFunds,
    /// Missing or invalid credentials on a request.
    Unauthorized,
    /// Credentials were presented but rejected.
    Forbidden,
    /// Storage failure or unexpected condition.
    Internal,
}

/// Main error type for SmallBank ledger operations.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Invalid input.
    #[error("{message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Insufficient funds.
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        account_id: AccountId,
        requested: Decimal,
        available: Decimal,
    },

    /// Request carried no valid credentials.
    #[error("Unauthorized")]
    Unauthorized,

    /// Credentials rejected.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Per-account lock could not be acquired in time.
    #[error("Timed out waiting for lock on account {account_id}")]
    LockTimeout { account_id: AccountId },

    /// Storage backend failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A multi-step update failed and could not be rolled back.
    #[error("Partial failure between {origin} and {destination}: {reason}")]
    PartialFailure {
        origin: AccountId,
        destination: AccountId,
        reason: String,
    },

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Create a validation error without a field.
    pub fn validation(message: impl Into<String>) -> Self {
        LedgerError::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a validation error for a specific input field.
    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        LedgerError::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Validation { .. } => ErrorKind::Validation,
            LedgerError::AccountNotFound(_) => ErrorKind::NotFound,
            LedgerError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            LedgerError::Unauthorized => ErrorKind::Unauthorized,
            LedgerError::Forbidden(_) => ErrorKind::Forbidden,
            LedgerError::LockTimeout { .. }
            | LedgerError::Storage(_)
            | LedgerError::PartialFailure { .. }
            | LedgerError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::LockTimeout { .. })
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            LedgerError::Validation { .. } => "VALIDATION_ERROR",
            LedgerError::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            LedgerError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            LedgerError::Unauthorized => "UNAUTHORIZED",
            LedgerError::Forbidden(_) => "FORBIDDEN",
            LedgerError::LockTimeout { .. } => "LOCK_TIMEOUT",
            LedgerError::Storage(_) => "STORAGE_ERROR",
            LedgerError::PartialFailure { .. } => "PARTIAL_FAILURE",
            LedgerError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show to API clients.
    ///
    /// Internal failures are collapsed into a generic message; their detail
    /// belongs in the logs.
    pub fn public_message(&self) -> String {
        match self {
            LedgerError::AccountNotFound(_) => "Account not found".to_string(),
            LedgerError::InsufficientFunds { .. } => "Insufficient funds".to_string(),
            LedgerError::LockTimeout { .. } => "Account is busy, retry later".to_string(),
            LedgerError::Storage(_) | LedgerError::PartialFailure { .. } | LedgerError::Internal(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_kinds() {
        let id = AccountId::parse("acc1").unwrap();

        assert_eq!(LedgerError::validation("bad").kind(), ErrorKind::Validation);
        assert_eq!(LedgerError::AccountNotFound(id.clone()).kind(), ErrorKind::NotFound);
        assert_eq!(
            LedgerError::InsufficientFunds {
                account_id: id.clone(),
                requested: dec!(150),
                available: dec!(100),
            }
            .kind(),
            ErrorKind::InsufficientFunds
        );
        assert_eq!(
            LedgerError::PartialFailure {
                origin: id.clone(),
                destination: id,
                reason: "boom".into(),
            }
            .kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_retryable() {
        let id = AccountId::parse("acc1").unwrap();
        assert!(LedgerError::LockTimeout { account_id: id }.is_retryable());
        assert!(!LedgerError::Storage("down".into()).is_retryable());
    }

    #[test]
    fn test_public_message_hides_internals() {
        let err = LedgerError::Storage("connection refused to 10.0.0.3".into());
        assert_eq!(err.public_message(), "Internal server error");
        assert_eq!(err.error_code(), "STORAGE_ERROR");

        let err = LedgerError::validation_field("amount must be greater than zero", "amount");
        assert_eq!(err.public_message(), "amount must be greater than zero");
    }
}
