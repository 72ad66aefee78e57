//! Identifier types for SmallBank ledger entities.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::LedgerError;

/// Maximum length of an account identifier, matching the `accounts.id` column.
pub const MAX_ACCOUNT_ID_LEN: usize = 255;

/// Opaque identifier for an account.
///
/// Account ids are plain strings. Surrounding whitespace is trimmed; the
/// remaining value must be non-empty, at most [`MAX_ACCOUNT_ID_LEN`] characters
/// and free of control characters. Numeric-looking ids are kept verbatim, so
/// `"007"` and `"7"` are different accounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    /// Parse and validate an account id.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, LedgerError> {
        let trimmed = raw.as_ref().trim();

        if trimmed.is_empty() {
            return Err(LedgerError::validation_field(
                "account id must not be empty",
                "account_id",
            ));
        }

        if trimmed.chars().count() > MAX_ACCOUNT_ID_LEN {
            return Err(LedgerError::validation_field(
                format!("account id must be at most {MAX_ACCOUNT_ID_LEN} characters"),
                "account_id",
            ));
        }

        if trimmed.chars().any(char::is_control) {
            return Err(LedgerError::validation_field(
                "account id must not contain control characters",
                "account_id",
            ));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Build an account id from an unsigned integer, using its decimal form.
    pub fn from_number(n: u64) -> Self {
        Self(n.to_string())
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for AccountId {
    type Error = LedgerError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for AccountId {
    type Error = LedgerError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.0
    }
}

impl AsRef<str> for AccountId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Prefix used when rendering transaction ids.
const TRANSACTION_ID_PREFIX: &str = "txn_";

/// Unique identifier for a recorded transaction.
/// Uses UUID v7 for time-ordered identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransactionId(Uuid);

impl TransactionId {
    /// Create a new transaction ID.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", TRANSACTION_ID_PREFIX, self.0)
    }
}

impl TryFrom<String> for TransactionId {
    type Error = uuid::Error;

    /// Accepts the id with or without the `txn_` prefix.
    fn try_from(s: String) -> Result<Self, Self::Error> {
        let raw = s.strip_prefix(TRANSACTION_ID_PREFIX).unwrap_or(&s);
        Ok(Self(Uuid::parse_str(raw)?))
    }
}

impl From<TransactionId> for String {
    fn from(id: TransactionId) -> Self {
        id.to_string()
    }
}
