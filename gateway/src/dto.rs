//! Request and response bodies.
//!
//! Balances and amounts go out as JSON numbers. Account ids come in as JSON
//! strings or non-negative integers; an integer is normalized to its decimal
//! string, so `100` and `"100"` name the same account.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use smallbank_common::{AccountId, LedgerError, Result, Timestamp, TransactionId};
use smallbank_ledger::{Account, Transaction, TransactionType};

/// Account id as sent by clients.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AccountIdInput {
    Text(String),
    Number(u64),
}

impl AccountIdInput {
    pub fn into_account_id(self) -> Result<AccountId> {
        match self {
            AccountIdInput::Text(s) => AccountId::parse(s),
            AccountIdInput::Number(n) => Ok(AccountId::from_number(n)),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// `POST /api/event` body, discriminated by `type`.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EventRequest {
    Deposit {
        destination: AccountIdInput,
        amount: Decimal,
    },
    Withdraw {
        origin: AccountIdInput,
        amount: Decimal,
    },
    Transfer {
        origin: AccountIdInput,
        destination: AccountIdInput,
        amount: Decimal,
    },
}

#[derive(Debug, Default, Serialize)]
pub struct EventResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<AccountView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<AccountView>,
}

#[derive(Debug, Deserialize)]
pub struct AccountQuery {
    pub account_id: Option<String>,
}

impl AccountQuery {
    pub fn account_id(self) -> Result<AccountId> {
        match self.account_id {
            Some(id) => AccountId::parse(id),
            None => Err(LedgerError::validation_field(
                "account_id is required",
                "account_id",
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub account_id: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub id: AccountIdInput,
    #[serde(default)]
    pub initial_balance: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountView {
    pub id: AccountId,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
}

impl From<Account> for AccountView {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            balance: account.balance,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionView {
    pub id: TransactionId,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub account_id: AccountId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_account_id: Option<AccountId>,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub timestamp: Timestamp,
}

impl From<Transaction> for TransactionView {
    fn from(tx: Transaction) -> Self {
        Self {
            id: tx.id,
            transaction_type: tx.transaction_type,
            account_id: tx.account_id,
            destination_account_id: tx.destination_account_id,
            amount: tx.amount.value(),
            timestamp: tx.timestamp,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub transactions: Vec<TransactionView>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub storage: &'static str,
}
