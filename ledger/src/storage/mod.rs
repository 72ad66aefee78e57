//! Storage adapters.
//!
//! A [`StorageAdapter`] is the sole authority for account and transaction
//! state. Adapters offer plain primitives only; read-modify-write atomicity is
//! provided by the [`LedgerEngine`](crate::LedgerEngine) through per-account
//! locks.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::info;

use smallbank_common::{AccountId, LedgerError};

use crate::account::Account;
use crate::config::{StorageConfig, StorageKind};
use crate::transaction::{NewTransaction, Transaction};

pub mod memory;
pub mod postgres;

pub use memory::MemoryAdapter;
pub use postgres::PostgresAdapter;

/// Number of transactions returned by a history query when no limit is given.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Errors reported by storage adapters.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Account does not exist.
    #[error("Account not found: {0}")]
    NotFound(AccountId),

    /// Account already exists.
    #[error("Account already exists: {0}")]
    AlreadyExists(AccountId),

    /// Negative balance handed to the adapter.
    #[error("Invalid balance: {0}")]
    InvalidBalance(Decimal),

    /// Backend failure.
    #[error("Database error: {0}")]
    Database(String),

    /// Stored row could not be decoded.
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl From<StorageError> for LedgerError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(id) => LedgerError::AccountNotFound(id),
            other => LedgerError::Storage(other.to_string()),
        }
    }
}

/// Persistence contract shared by every backend.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;

    /// Look up an account.
    async fn get_account(&self, id: &AccountId) -> Result<Option<Account>, StorageError>;

    /// Create an account. Fails with `AlreadyExists` if the id is taken.
    async fn create_account(
        &self,
        id: &AccountId,
        initial_balance: Decimal,
    ) -> Result<Account, StorageError>;

    /// Overwrite an account balance. Fails with `NotFound` if absent.
    async fn update_account_balance(
        &self,
        id: &AccountId,
        new_balance: Decimal,
    ) -> Result<Account, StorageError>;

    /// Assign id and timestamp to `transaction` and persist it.
    async fn add_transaction(&self, transaction: NewTransaction)
        -> Result<Transaction, StorageError>;

    /// Transactions debiting or crediting `account_id`, newest first.
    async fn get_transactions(
        &self,
        account_id: &AccountId,
        limit: usize,
    ) -> Result<Vec<Transaction>, StorageError>;

    /// Delete every account and transaction.
    async fn reset(&self) -> Result<(), StorageError>;
}

/// Build the adapter selected by `config`.
///
/// The returned instance is owned by the caller; nothing is cached globally.
pub async fn connect(config: &StorageConfig) -> Result<Arc<dyn StorageAdapter>, StorageError> {
    match config.kind {
        StorageKind::Memory => {
            info!(backend = "memory", "Using in-memory storage");
            Ok(Arc::new(MemoryAdapter::new()))
        }
        StorageKind::Postgres => {
            let adapter = PostgresAdapter::connect(config).await?;
            adapter.migrate().await?;
            info!(backend = "postgres", "Using PostgreSQL storage");
            Ok(Arc::new(adapter))
        }
    }
}

fn check_balance(balance: Decimal) -> Result<(), StorageError> {
    if balance < Decimal::ZERO {
        return Err(StorageError::InvalidBalance(balance));
    }
    Ok(())
}
