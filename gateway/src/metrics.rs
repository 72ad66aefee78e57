//! Request counters served at `/metrics`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

use smallbank_common::{ErrorKind, LedgerError};

/// Gateway metrics.
#[derive(Default)]
pub struct Metrics {
    /// Deposits applied.
    pub deposits: AtomicU64,
    /// Withdrawals applied.
    pub withdrawals: AtomicU64,
    /// Transfers applied.
    pub transfers: AtomicU64,
    /// Operations refused because of the request (validation, missing
    /// account, insufficient funds).
    pub rejected: AtomicU64,
    /// Operations that failed inside the ledger or storage.
    pub failed: AtomicU64,
    /// Successful logins.
    pub logins: AtomicU64,
    /// Rejected logins and requests without a valid token.
    pub auth_failures: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deposit_applied(&self) {
        self.deposits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn withdrawal_applied(&self) {
        self.withdrawals.fetch_add(1, Ordering::Relaxed);
    }

    pub fn transfer_applied(&self) {
        self.transfers.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a failed operation as rejected or failed depending on its kind.
    pub fn operation_error(&self, err: &LedgerError) {
        let counter = match err.kind() {
            ErrorKind::Internal => &self.failed,
            _ => &self.rejected,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn login_succeeded(&self) {
        self.logins.fetch_add(1, Ordering::Relaxed);
    }

    pub fn auth_failed(&self) {
        self.auth_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            deposits: self.deposits.load(Ordering::Relaxed),
            withdrawals: self.withdrawals.load(Ordering::Relaxed),
            transfers: self.transfers.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            logins: self.logins.load(Ordering::Relaxed),
            auth_failures: self.auth_failures.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub deposits: u64,
    pub withdrawals: u64,
    pub transfers: u64,
    pub rejected: u64,
    pub failed: u64,
    pub logins: u64,
    pub auth_failures: u64,
}

/// Shared metrics instance.
pub type SharedMetrics = Arc<Metrics>;
