//! Account definitions for ledger.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smallbank_common::AccountId;

/// A ledger account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique account identifier.
    pub id: AccountId,
    /// Current balance. Never negative.
    pub balance: Decimal,
}

impl Account {
    /// Create a new account.
    pub fn new(id: AccountId, balance: Decimal) -> Self {
        Self { id, balance }
    }
}
