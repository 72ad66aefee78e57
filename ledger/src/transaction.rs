//! Transaction records kept by the ledger.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smallbank_common::{AccountId, Amount, Timestamp, TransactionId};

/// Type of ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money credited to an account from outside the ledger.
    Deposit,
    /// Money debited from an account to outside the ledger.
    Withdraw,
    /// Money moved between two ledger accounts.
    Transfer,
}

impl TransactionType {
    /// Storage/wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "deposit",
            TransactionType::Withdraw => "withdraw",
            TransactionType::Transfer => "transfer",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown transaction type string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTransactionType(pub String);

impl fmt::Display for UnknownTransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown transaction type: {}", self.0)
    }
}

impl std::error::Error for UnknownTransactionType {}

impl FromStr for TransactionType {
    type Err = UnknownTransactionType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(TransactionType::Deposit),
            "withdraw" => Ok(TransactionType::Withdraw),
            "transfer" => Ok(TransactionType::Transfer),
            other => Err(UnknownTransactionType(other.to_string())),
        }
    }
}

/// A transaction that has not been persisted yet.
///
/// Only the constructors below can build one, so `destination_account_id` is
/// set exactly when the type is [`TransactionType::Transfer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    transaction_type: TransactionType,
    account_id: AccountId,
    destination_account_id: Option<AccountId>,
    amount: Amount,
}

impl NewTransaction {
    /// A deposit credited to `account_id`.
    pub fn deposit(account_id: AccountId, amount: Amount) -> Self {
        Self {
            transaction_type: TransactionType::Deposit,
            account_id,
            destination_account_id: None,
            amount,
        }
    }

    /// A withdrawal debited from `account_id`.
    pub fn withdraw(account_id: AccountId, amount: Amount) -> Self {
        Self {
            transaction_type: TransactionType::Withdraw,
            account_id,
            destination_account_id: None,
            amount,
        }
    }

    /// A transfer from `origin` to `destination`.
    pub fn transfer(origin: AccountId, destination: AccountId, amount: Amount) -> Self {
        Self {
            transaction_type: TransactionType::Transfer,
            account_id: origin,
            destination_account_id: Some(destination),
            amount,
        }
    }

    /// Complete the record with its id and timestamp.
    pub fn into_transaction(self, id: TransactionId, timestamp: Timestamp) -> Transaction {
        Transaction {
            id,
            transaction_type: self.transaction_type,
            account_id: self.account_id,
            destination_account_id: self.destination_account_id,
            amount: self.amount,
            timestamp,
        }
    }
}

/// A recorded, immutable ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction ID.
    pub id: TransactionId,
    /// Transaction type.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// Account debited (withdraw, transfer) or credited (deposit).
    pub account_id: AccountId,
    /// Account credited by a transfer.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub destination_account_id: Option<AccountId>,
    /// Amount moved.
    pub amount: Amount,
    /// When this transaction was recorded.
    pub timestamp: Timestamp,
}

impl Transaction {
    /// Check whether the transaction debits or credits `account_id`.
    pub fn involves(&self, account_id: &AccountId) -> bool {
        &self.account_id == account_id || self.destination_account_id.as_ref() == Some(account_id)
    }
}
