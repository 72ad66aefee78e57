//! SmallBank Ledger Engine
//!
//! Account balances, transaction history and the storage adapters behind them.
//! All balance mutations go through [`LedgerEngine`], which serializes them per
//! account.

pub mod account;
pub mod balance;
pub mod config;
pub mod engine;
pub mod lock_manager;
pub mod storage;
pub mod transaction;

pub use account::Account;
pub use config::{LedgerConfig, LockConfig, StorageConfig, StorageKind};
pub use engine::{DepositOutcome, LedgerEngine, TransferOutcome, WithdrawOutcome, MAX_HISTORY_LIMIT};
pub use lock_manager::{AccountLockManager, AccountLocks};
pub use storage::{StorageAdapter, StorageError, DEFAULT_HISTORY_LIMIT};
pub use transaction::{NewTransaction, Transaction, TransactionType};
