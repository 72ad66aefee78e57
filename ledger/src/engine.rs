//! Core ledger engine implementation.
//!
//! The engine is the only component that mutates balances. Every operation
//! holds the locks of the accounts it touches for the whole read, compute,
//! write and record sequence.
//!
//! ## Transfer sequence
//!
//! 1. Lock origin and destination (ascending id order)
//! 2. Check origin exists and has sufficient funds
//! 3. Create the destination with balance 0 if unknown
//! 4. Debit origin, credit destination
//! 5. Record one `transfer` transaction
//!
//! If step 4 or 5 fails after a balance was written, the written balances are
//! restored in reverse order. A failed restore surfaces as `PartialFailure`.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use smallbank_common::{validate_balance, AccountId, Amount, LedgerError, Result};

use crate::account::Account;
use crate::balance;
use crate::config::LockConfig;
use crate::lock_manager::AccountLockManager;
use crate::storage::{StorageAdapter, StorageError, DEFAULT_HISTORY_LIMIT};
use crate::transaction::{NewTransaction, Transaction};

/// Upper bound for a single history query.
pub const MAX_HISTORY_LIMIT: usize = 100;

/// Result of a deposit.
#[derive(Debug, Clone, Serialize)]
pub struct DepositOutcome {
    pub destination: Account,
    pub transaction: Transaction,
}

/// Result of a withdrawal.
#[derive(Debug, Clone, Serialize)]
pub struct WithdrawOutcome {
    pub origin: Account,
    pub transaction: Transaction,
}

/// Result of a transfer.
#[derive(Debug, Clone, Serialize)]
pub struct TransferOutcome {
    pub origin: Account,
    pub destination: Account,
    pub transaction: Transaction,
}

/// The ledger engine applies deposits, withdrawals and transfers to a
/// [`StorageAdapter`].
pub struct LedgerEngine {
    storage: Arc<dyn StorageAdapter>,
    locks: AccountLockManager,
}

impl LedgerEngine {
    /// Create a new ledger engine over `storage`.
    pub fn new(storage: Arc<dyn StorageAdapter>, lock_config: LockConfig) -> Self {
        Self {
            storage,
            locks: AccountLockManager::new(lock_config),
        }
    }

    /// Name of the storage backend.
    pub fn backend(&self) -> &'static str {
        self.storage.backend()
    }

    /// Current balance of `account_id`.
    #[instrument(skip(self))]
    pub async fn get_balance(&self, account_id: &AccountId) -> Result<Decimal> {
        Ok(self.get_account(account_id).await?.balance)
    }

    /// Look up an account.
    #[instrument(skip(self))]
    pub async fn get_account(&self, account_id: &AccountId) -> Result<Account> {
        self.storage
            .get_account(account_id)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(account_id.clone()))
    }

    /// Get or create an account.
    ///
    /// An existing account is returned unchanged; `initial_balance` only
    /// applies to a new one.
    #[instrument(skip(self))]
    pub async fn create_account(
        &self,
        account_id: &AccountId,
        initial_balance: Decimal,
    ) -> Result<Account> {
        let initial_balance = validate_balance(initial_balance)?;
        let _locks = self.locks.acquire(&[account_id]).await?;

        if let Some(existing) = self.storage.get_account(account_id).await? {
            return Ok(existing);
        }

        let account = self.storage.create_account(account_id, initial_balance).await?;
        info!(account = %account_id, balance = %account.balance, "Account created");
        Ok(account)
    }

    /// Credit `amount` to `destination_id`, creating the account if needed.
    #[instrument(skip(self))]
    pub async fn deposit(&self, destination_id: &AccountId, amount: Amount) -> Result<DepositOutcome> {
        let _locks = self.locks.acquire(&[destination_id]).await?;

        let before = self.get_or_create(destination_id).await?;
        let new_balance = balance::credit(destination_id, before.balance, amount)
            .map_err(|e| rejected("deposit", destination_id, e))?;

        let destination = self
            .storage
            .update_account_balance(destination_id, new_balance)
            .await?;

        let transaction = match self
            .storage
            .add_transaction(NewTransaction::deposit(destination_id.clone(), amount))
            .await
        {
            Ok(transaction) => transaction,
            Err(e) => return Err(self.compensate(&[&before], destination_id, destination_id, e).await),
        };

        info!(
            account = %destination_id,
            amount = %amount,
            balance = %destination.balance,
            transaction_id = %transaction.id,
            "Deposit applied"
        );

        Ok(DepositOutcome {
            destination,
            transaction,
        })
    }

    /// Debit `amount` from `origin_id`.
    #[instrument(skip(self))]
    pub async fn withdraw(&self, origin_id: &AccountId, amount: Amount) -> Result<WithdrawOutcome> {
        let _locks = self.locks.acquire(&[origin_id]).await?;

        let before = self.get_account(origin_id).await?;
        let new_balance = balance::debit(origin_id, before.balance, amount)
            .map_err(|e| rejected("withdraw", origin_id, e))?;

        let origin = self
            .storage
            .update_account_balance(origin_id, new_balance)
            .await?;

        let transaction = match self
            .storage
            .add_transaction(NewTransaction::withdraw(origin_id.clone(), amount))
            .await
        {
            Ok(transaction) => transaction,
            Err(e) => return Err(self.compensate(&[&before], origin_id, origin_id, e).await),
        };

        info!(
            account = %origin_id,
            amount = %amount,
            balance = %origin.balance,
            transaction_id = %transaction.id,
            "Withdrawal applied"
        );

        Ok(WithdrawOutcome {
            origin,
            transaction,
        })
    }

    /// Move `amount` from `origin_id` to `destination_id`.
    #[instrument(skip(self))]
    pub async fn transfer(
        &self,
        origin_id: &AccountId,
        destination_id: &AccountId,
        amount: Amount,
    ) -> Result<TransferOutcome> {
        if origin_id == destination_id {
            return Err(LedgerError::validation_field(
                "origin and destination must differ",
                "destination",
            ));
        }

        let _locks = self.locks.acquire(&[origin_id, destination_id]).await?;

        let origin_before = self.get_account(origin_id).await?;
        let origin_balance = balance::debit(origin_id, origin_before.balance, amount)
            .map_err(|e| rejected("transfer", origin_id, e))?;

        let destination_before = self.get_or_create(destination_id).await?;
        let destination_balance = balance::credit(destination_id, destination_before.balance, amount)
            .map_err(|e| rejected("transfer", destination_id, e))?;

        let origin = self
            .storage
            .update_account_balance(origin_id, origin_balance)
            .await?;

        let destination = match self
            .storage
            .update_account_balance(destination_id, destination_balance)
            .await
        {
            Ok(account) => account,
            Err(e) => {
                return Err(self
                    .compensate(&[&origin_before], origin_id, destination_id, e)
                    .await)
            }
        };

        let transaction = match self
            .storage
            .add_transaction(NewTransaction::transfer(
                origin_id.clone(),
                destination_id.clone(),
                amount,
            ))
            .await
        {
            Ok(transaction) => transaction,
            Err(e) => {
                return Err(self
                    .compensate(
                        &[&origin_before, &destination_before],
                        origin_id,
                        destination_id,
                        e,
                    )
                    .await)
            }
        };

        info!(
            origin = %origin_id,
            destination = %destination_id,
            amount = %amount,
            transaction_id = %transaction.id,
            "Transfer applied"
        );

        Ok(TransferOutcome {
            origin,
            destination,
            transaction,
        })
    }

    /// Transactions involving `account_id`, newest first.
    ///
    /// `limit` defaults to [`DEFAULT_HISTORY_LIMIT`] and is capped at
    /// [`MAX_HISTORY_LIMIT`].
    #[instrument(skip(self))]
    pub async fn transactions(
        &self,
        account_id: &AccountId,
        limit: Option<usize>,
    ) -> Result<Vec<Transaction>> {
        self.get_account(account_id).await?;

        let limit = limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .min(MAX_HISTORY_LIMIT);
        Ok(self.storage.get_transactions(account_id, limit).await?)
    }

    /// Delete all accounts and transactions.
    #[instrument(skip(self))]
    pub async fn reset(&self) -> Result<()> {
        self.storage.reset().await?;
        self.locks.prune();
        info!(backend = self.storage.backend(), "Ledger reset");
        Ok(())
    }

    /// Caller must hold the lock for `account_id`.
    async fn get_or_create(&self, account_id: &AccountId) -> Result<Account> {
        if let Some(account) = self.storage.get_account(account_id).await? {
            return Ok(account);
        }

        match self.storage.create_account(account_id, Decimal::ZERO).await {
            Ok(account) => {
                info!(account = %account_id, "Account created on first credit");
                Ok(account)
            }
            // another process sharing the database got there first
            Err(StorageError::AlreadyExists(_)) => self.get_account(account_id).await,
            Err(e) => Err(e.into()),
        }
    }

    /// Restore `written` balances in reverse order after a failed step.
    async fn compensate(
        &self,
        written: &[&Account],
        origin: &AccountId,
        destination: &AccountId,
        cause: StorageError,
    ) -> LedgerError {
        warn!(
            origin = %origin,
            destination = %destination,
            error = %cause,
            "Operation failed after a balance write, restoring previous balances"
        );

        for account in written.iter().rev() {
            if let Err(restore_error) = self
                .storage
                .update_account_balance(&account.id, account.balance)
                .await
            {
                error!(
                    origin = %origin,
                    destination = %destination,
                    account = %account.id,
                    error = %cause,
                    restore_error = %restore_error,
                    "Compensation failed, ledger left inconsistent"
                );
                return LedgerError::PartialFailure {
                    origin: origin.clone(),
                    destination: destination.clone(),
                    reason: format!("{cause}; restore of {} failed: {restore_error}", account.id),
                };
            }
        }

        cause.into()
    }
}

fn rejected(operation: &str, account_id: &AccountId, err: LedgerError) -> LedgerError {
    warn!(operation, account = %account_id, error = %err, "Operation rejected");
    err
}
