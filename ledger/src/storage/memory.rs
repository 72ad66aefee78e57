//! In-memory storage adapter.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use tracing::debug;

use smallbank_common::{AccountId, TransactionId};

use super::{check_balance, StorageAdapter, StorageError};
use crate::account::Account;
use crate::transaction::{NewTransaction, Transaction};

#[derive(Default)]
struct MemoryState {
    accounts: HashMap<AccountId, Account>,
    /// Append-only; newest last.
    transactions: Vec<Transaction>,
}

/// Process-local storage. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryAdapter {
    state: RwLock<MemoryState>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts.
    pub fn account_count(&self) -> usize {
        self.state.read().accounts.len()
    }

    /// Number of stored transactions.
    pub fn transaction_count(&self) -> usize {
        self.state.read().transactions.len()
    }
}

#[async_trait]
impl StorageAdapter for MemoryAdapter {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get_account(&self, id: &AccountId) -> Result<Option<Account>, StorageError> {
        Ok(self.state.read().accounts.get(id).cloned())
    }

    async fn create_account(
        &self,
        id: &AccountId,
        initial_balance: Decimal,
    ) -> Result<Account, StorageError> {
        check_balance(initial_balance)?;

        let mut state = self.state.write();
        if state.accounts.contains_key(id) {
            return Err(StorageError::AlreadyExists(id.clone()));
        }

        let account = Account::new(id.clone(), initial_balance);
        state.accounts.insert(id.clone(), account.clone());
        Ok(account)
    }

    async fn update_account_balance(
        &self,
        id: &AccountId,
        new_balance: Decimal,
    ) -> Result<Account, StorageError> {
        check_balance(new_balance)?;

        let mut state = self.state.write();
        let account = state
            .accounts
            .get_mut(id)
            .ok_or_else(|| StorageError::NotFound(id.clone()))?;
        account.balance = new_balance;
        Ok(account.clone())
    }

    async fn add_transaction(
        &self,
        transaction: NewTransaction,
    ) -> Result<Transaction, StorageError> {
        let transaction = transaction.into_transaction(TransactionId::new(), smallbank_common::now());
        self.state.write().transactions.push(transaction.clone());
        Ok(transaction)
    }

    async fn get_transactions(
        &self,
        account_id: &AccountId,
        limit: usize,
    ) -> Result<Vec<Transaction>, StorageError> {
        let state = self.state.read();
        Ok(state
            .transactions
            .iter()
            .rev()
            .filter(|tx| tx.involves(account_id))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn reset(&self) -> Result<(), StorageError> {
        let mut state = self.state.write();
        debug!(
            accounts = state.accounts.len(),
            transactions = state.transactions.len(),
            "Clearing in-memory storage"
        );
        state.accounts.clear();
        state.transactions.clear();
        Ok(())
    }
}
