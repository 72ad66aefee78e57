//! Per-account lock management.
//!
//! Every balance read-modify-write runs while holding the lock of each account
//! it touches. Multi-account operations acquire locks in ascending id order so
//! two transfers in opposite directions cannot deadlock.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

use smallbank_common::{AccountId, LedgerError, Result};

use crate::config::LockConfig;

type LockTable = DashMap<AccountId, Arc<Mutex<()>>>;

/// Locks held by one ledger operation. Released on drop.
///
/// Dropping also removes each table entry nobody else holds or waits on, so
/// the table only tracks accounts with an operation in flight.
#[derive(Debug)]
pub struct AccountLocks {
    held: Vec<(AccountId, OwnedMutexGuard<()>)>,
    table: Arc<LockTable>,
}

#[cfg(test)]
impl AccountLocks {
    fn account_ids(&self) -> impl Iterator<Item = &AccountId> {
        self.held.iter().map(|(id, _)| id)
    }
}

impl Drop for AccountLocks {
    fn drop(&mut self) {
        // the table and our guard account for two references
        for (account_id, _) in &self.held {
            self.table
                .remove_if(account_id, |_, mutex| Arc::strong_count(mutex) == 2);
        }
    }
}

/// Manager for per-account locks.
pub struct AccountLockManager {
    /// One mutex per account id with an operation in flight.
    locks: Arc<LockTable>,
    /// Configuration.
    config: LockConfig,
}

impl AccountLockManager {
    /// Create a new lock manager.
    pub fn new(config: LockConfig) -> Self {
        Self {
            locks: Arc::new(DashMap::new()),
            config,
        }
    }

    /// Acquire the locks for every id in `account_ids`.
    ///
    /// Ids are de-duplicated and locked in ascending order. Each individual
    /// acquisition is bounded by the configured timeout; on timeout the locks
    /// already taken are released and `LockTimeout` is returned.
    pub async fn acquire(&self, account_ids: &[&AccountId]) -> Result<AccountLocks> {
        let mut ordered: Vec<AccountId> = account_ids.iter().map(|id| (*id).clone()).collect();
        ordered.sort();
        ordered.dedup();

        let mut locks = AccountLocks {
            held: Vec::with_capacity(ordered.len()),
            table: self.locks.clone(),
        };

        for account_id in ordered {
            let mutex = self.mutex_for(&account_id);

            match tokio::time::timeout(self.config.acquisition_timeout, mutex.lock_owned()).await {
                Ok(guard) => {
                    debug!(account = %account_id, "Account lock acquired");
                    locks.held.push((account_id, guard));
                }
                Err(_) => {
                    warn!(
                        account = %account_id,
                        timeout_ms = self.config.acquisition_timeout.as_millis() as u64,
                        "Account lock acquisition timed out"
                    );
                    return Err(LedgerError::LockTimeout { account_id });
                }
            }
        }

        Ok(locks)
    }

    /// Number of account ids currently tracked.
    pub fn tracked_accounts(&self) -> usize {
        self.locks.len()
    }

    /// Drop entries that no operation holds or waits on.
    ///
    /// Entries normally go away when their [`AccountLocks`] drops. A waiter
    /// that times out while the holder releases can leave one behind.
    pub fn prune(&self) {
        let before = self.locks.len();
        self.locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
        debug!(
            removed = before.saturating_sub(self.locks.len()),
            "Pruned idle account locks"
        );
    }

    fn mutex_for(&self, account_id: &AccountId) -> Arc<Mutex<()>> {
        self.locks
            .entry(account_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl Default for AccountLockManager {
    fn default() -> Self {
        Self::new(LockConfig::default())
    }
}
