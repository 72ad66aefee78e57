//! Shared helpers for ledger integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use smallbank_common::{AccountId, Amount};
use smallbank_ledger::storage::MemoryAdapter;
use smallbank_ledger::{
    Account, LedgerEngine, LockConfig, NewTransaction, StorageAdapter, StorageError, Transaction,
    TransactionType,
};

pub fn id(s: &str) -> AccountId {
    AccountId::parse(s).unwrap()
}

pub fn amount(value: Decimal) -> Amount {
    Amount::new(value).unwrap()
}

pub fn memory_engine() -> LedgerEngine {
    LedgerEngine::new(Arc::new(MemoryAdapter::new()), LockConfig::default())
}

/// Memory adapter that fails selected writes on demand.
#[derive(Default)]
pub struct FailingAdapter {
    inner: MemoryAdapter,
    /// Balance updates for this account fail.
    pub fail_updates_for: parking_lot::Mutex<Option<AccountId>>,
    /// Once this many balance updates succeeded, every further update fails.
    pub update_budget: parking_lot::Mutex<Option<usize>>,
    /// Every `add_transaction` fails.
    pub fail_records: AtomicBool,
    updates: AtomicUsize,
}

impl FailingAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transaction_count(&self) -> usize {
        self.inner.transaction_count()
    }
}

#[async_trait]
impl StorageAdapter for FailingAdapter {
    fn backend(&self) -> &'static str {
        "failing-memory"
    }

    async fn get_account(&self, id: &AccountId) -> Result<Option<Account>, StorageError> {
        self.inner.get_account(id).await
    }

    async fn create_account(
        &self,
        id: &AccountId,
        initial_balance: Decimal,
    ) -> Result<Account, StorageError> {
        self.inner.create_account(id, initial_balance).await
    }

    async fn update_account_balance(
        &self,
        id: &AccountId,
        new_balance: Decimal,
    ) -> Result<Account, StorageError> {
        if self.fail_updates_for.lock().as_ref() == Some(id) {
            return Err(StorageError::Database(format!("injected failure for {id}")));
        }
        if let Some(budget) = *self.update_budget.lock() {
            if self.updates.load(Ordering::SeqCst) >= budget {
                return Err(StorageError::Database("injected failure".into()));
            }
        }
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update_account_balance(id, new_balance).await
    }

    async fn add_transaction(
        &self,
        transaction: NewTransaction,
    ) -> Result<Transaction, StorageError> {
        if self.fail_records.load(Ordering::SeqCst) {
            return Err(StorageError::Database("injected record failure".into()));
        }
        self.inner.add_transaction(transaction).await
    }

    async fn get_transactions(
        &self,
        account_id: &AccountId,
        limit: usize,
    ) -> Result<Vec<Transaction>, StorageError> {
        self.inner.get_transactions(account_id, limit).await
    }

    async fn reset(&self) -> Result<(), StorageError> {
        self.inner.reset().await
    }
}

/// Contract every storage adapter must satisfy. Starts by resetting the
/// adapter, so it must not share state with concurrently running tests.
pub async fn run_storage_contract(storage: &dyn StorageAdapter) {
    storage.reset().await.unwrap();

    let a = id("conformance-a");
    let b = id("conformance-b");

    // missing accounts
    assert!(storage.get_account(&a).await.unwrap().is_none());
    assert!(matches!(
        storage.update_account_balance(&a, dec!(1)).await,
        Err(StorageError::NotFound(_))
    ));

    // create and duplicate create
    let created = storage.create_account(&a, dec!(12.50)).await.unwrap();
    assert_eq!(created, Account::new(a.clone(), dec!(12.50)));
    assert!(matches!(
        storage.create_account(&a, dec!(0)).await,
        Err(StorageError::AlreadyExists(_))
    ));
    assert_eq!(
        storage.get_account(&a).await.unwrap().unwrap().balance,
        dec!(12.50)
    );

    // negative balances never stored
    assert!(matches!(
        storage.create_account(&b, dec!(-1)).await,
        Err(StorageError::InvalidBalance(_))
    ));
    assert!(matches!(
        storage.update_account_balance(&a, dec!(-0.01)).await,
        Err(StorageError::InvalidBalance(_))
    ));

    // overwrite
    let updated = storage.update_account_balance(&a, dec!(99.99)).await.unwrap();
    assert_eq!(updated.balance, dec!(99.99));
    storage.create_account(&b, dec!(0)).await.unwrap();

    // history: ids assigned, newest first, both sides of a transfer
    let deposit = storage
        .add_transaction(NewTransaction::deposit(a.clone(), amount(dec!(5))))
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    let transfer = storage
        .add_transaction(NewTransaction::transfer(a.clone(), b.clone(), amount(dec!(3))))
        .await
        .unwrap();
    assert_ne!(deposit.id, transfer.id);
    assert_eq!(transfer.transaction_type, TransactionType::Transfer);
    assert_eq!(transfer.destination_account_id.as_ref(), Some(&b));

    let history = storage.get_transactions(&a, 10).await.unwrap();
    assert_eq!(history, vec![transfer.clone(), deposit.clone()]);
    assert_eq!(storage.get_transactions(&a, 1).await.unwrap(), vec![transfer.clone()]);
    assert_eq!(storage.get_transactions(&b, 10).await.unwrap(), vec![transfer]);

    // reset is idempotent
    storage.reset().await.unwrap();
    storage.reset().await.unwrap();
    assert!(storage.get_account(&a).await.unwrap().is_none());
    assert!(storage.get_transactions(&a, 10).await.unwrap().is_empty());
}
