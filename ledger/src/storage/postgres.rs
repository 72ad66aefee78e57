//! PostgreSQL storage adapter.
//!
//! ## Schema
//!
//! `accounts(id, balance)` and `transactions(id, type, account_id,
//! destination_account_id, amount, timestamp)`, with indexes on both account
//! columns of `transactions`. [`PostgresAdapter::migrate`] creates them if
//! missing.
//!
//! ## Error Mapping
//!
//! | SQLx error | PostgreSQL code | StorageError |
//! |------------|-----------------|--------------|
//! | Database (unique violation) on account insert | `23505` | `AlreadyExists` |
//! | Row decode failure | N/A | `Corrupt` |
//! | Anything else | any | `Database` |

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{debug, instrument};
use uuid::Uuid;

use smallbank_common::{AccountId, Amount, Timestamp, TransactionId};

use super::{check_balance, StorageAdapter, StorageError};
use crate::account::Account;
use crate::config::StorageConfig;
use crate::transaction::{NewTransaction, Transaction, TransactionType, UnknownTransactionType};

const UNIQUE_VIOLATION: &str = "23505";

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS accounts (
        id VARCHAR(255) PRIMARY KEY,
        balance NUMERIC(15, 2) NOT NULL DEFAULT 0 CHECK (balance >= 0)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS transactions (
        id UUID PRIMARY KEY,
        type VARCHAR(50) NOT NULL,
        account_id VARCHAR(255) NOT NULL REFERENCES accounts(id),
        destination_account_id VARCHAR(255) REFERENCES accounts(id),
        amount NUMERIC(15, 2) NOT NULL CHECK (amount > 0),
        timestamp TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_transactions_account_id ON transactions(account_id)",
    "CREATE INDEX IF NOT EXISTS idx_transactions_destination_account_id ON transactions(destination_account_id)",
];

/// PostgreSQL-backed storage.
#[derive(Debug, Clone)]
pub struct PostgresAdapter {
    pool: PgPool,
}

impl PostgresAdapter {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool.
    pub async fn connect(config: &StorageConfig) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create tables and indexes if they do not exist.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), StorageError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("migrate", e))?;
        }
        debug!("Schema ready");
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for PostgresAdapter {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn get_account(&self, id: &AccountId) -> Result<Option<Account>, StorageError> {
        let row = sqlx::query("SELECT id, balance FROM accounts WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_account", e))?;

        row.as_ref().map(account_from_row).transpose()
    }

    async fn create_account(
        &self,
        id: &AccountId,
        initial_balance: Decimal,
    ) -> Result<Account, StorageError> {
        check_balance(initial_balance)?;

        let row = sqlx::query("INSERT INTO accounts (id, balance) VALUES ($1, $2) RETURNING id, balance")
            .bind(id.as_str())
            .bind(initial_balance)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StorageError::AlreadyExists(id.clone())
                } else {
                    map_sqlx_error("create_account", e)
                }
            })?;

        account_from_row(&row)
    }

    async fn update_account_balance(
        &self,
        id: &AccountId,
        new_balance: Decimal,
    ) -> Result<Account, StorageError> {
        check_balance(new_balance)?;

        let row = sqlx::query("UPDATE accounts SET balance = $1 WHERE id = $2 RETURNING id, balance")
            .bind(new_balance)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_account_balance", e))?;

        match row {
            Some(row) => account_from_row(&row),
            None => Err(StorageError::NotFound(id.clone())),
        }
    }

    async fn add_transaction(
        &self,
        transaction: NewTransaction,
    ) -> Result<Transaction, StorageError> {
        let transaction = transaction.into_transaction(TransactionId::new(), smallbank_common::now());

        sqlx::query(
            r#"
            INSERT INTO transactions (id, type, account_id, destination_account_id, amount, timestamp)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(*transaction.id.as_uuid())
        .bind(transaction.transaction_type.as_str())
        .bind(transaction.account_id.as_str())
        .bind(transaction.destination_account_id.as_ref().map(|id| id.as_str()))
        .bind(transaction.amount.value())
        .bind(transaction.timestamp)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("add_transaction", e))?;

        Ok(transaction)
    }

    async fn get_transactions(
        &self,
        account_id: &AccountId,
        limit: usize,
    ) -> Result<Vec<Transaction>, StorageError> {
        let rows = sqlx::query(
            r#"
            SELECT id, type, account_id, destination_account_id, amount, timestamp
            FROM transactions
            WHERE account_id = $1 OR destination_account_id = $1
            ORDER BY timestamp DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(account_id.as_str())
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_transactions", e))?;

        rows.iter().map(transaction_from_row).collect()
    }

    async fn reset(&self) -> Result<(), StorageError> {
        // transactions first: it references accounts
        sqlx::query("TRUNCATE TABLE transactions, accounts")
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("reset", e))?;
        Ok(())
    }
}

fn account_from_row(row: &PgRow) -> Result<Account, StorageError> {
    let id: String = row.try_get("id").map_err(corrupt)?;
    let balance: Decimal = row.try_get("balance").map_err(corrupt)?;
    let id = AccountId::parse(&id).map_err(|e| StorageError::Corrupt(e.to_string()))?;
    Ok(Account::new(id, balance.normalize()))
}

fn transaction_from_row(row: &PgRow) -> Result<Transaction, StorageError> {
    let id: Uuid = row.try_get("id").map_err(corrupt)?;
    let transaction_type: String = row.try_get("type").map_err(corrupt)?;
    let account_id: String = row.try_get("account_id").map_err(corrupt)?;
    let destination_account_id: Option<String> =
        row.try_get("destination_account_id").map_err(corrupt)?;
    let amount: Decimal = row.try_get("amount").map_err(corrupt)?;
    let timestamp: Timestamp = row.try_get("timestamp").map_err(corrupt)?;

    let transaction_type: TransactionType = transaction_type
        .parse()
        .map_err(|e: UnknownTransactionType| StorageError::Corrupt(e.to_string()))?;
    let account_id =
        AccountId::parse(&account_id).map_err(|e| StorageError::Corrupt(e.to_string()))?;
    let destination_account_id = destination_account_id
        .map(AccountId::parse)
        .transpose()
        .map_err(|e| StorageError::Corrupt(e.to_string()))?;
    let amount = Amount::new(amount).map_err(|e| StorageError::Corrupt(e.to_string()))?;

    let transaction = match (transaction_type, destination_account_id) {
        (TransactionType::Deposit, None) => NewTransaction::deposit(account_id, amount),
        (TransactionType::Withdraw, None) => NewTransaction::withdraw(account_id, amount),
        (TransactionType::Transfer, Some(destination)) => {
            NewTransaction::transfer(account_id, destination, amount)
        }
        (transaction_type, _) => {
            return Err(StorageError::Corrupt(format!(
                "transaction {id} of type {transaction_type} has inconsistent destination"
            )))
        }
    };

    Ok(transaction.into_transaction(TransactionId::from_uuid(id), timestamp))
}

fn corrupt(e: sqlx::Error) -> StorageError {
    StorageError::Corrupt(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION))
}

fn map_sqlx_error(operation: &str, e: sqlx::Error) -> StorageError {
    StorageError::Database(format!("{operation}: {e}"))
}
