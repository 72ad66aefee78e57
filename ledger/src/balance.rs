//! Balance arithmetic.
//!
//! Pure functions that compute a new balance or report which invariant the
//! change would break. Storage writes happen elsewhere.

use rust_decimal::Decimal;
use smallbank_common::{AccountId, Amount, LedgerError, Result, MAX_BALANCE};

/// Balance after crediting `amount`.
pub fn credit(account_id: &AccountId, balance: Decimal, amount: Amount) -> Result<Decimal> {
    match balance.checked_add(amount.value()) {
        Some(new_balance) if new_balance <= MAX_BALANCE => Ok(new_balance),
        _ => Err(LedgerError::validation_field(
            format!("deposit would exceed the maximum balance for account {account_id}"),
            "amount",
        )),
    }
}

/// Balance after debiting `amount`. Never negative.
pub fn debit(account_id: &AccountId, balance: Decimal, amount: Amount) -> Result<Decimal> {
    if balance < amount.value() {
        return Err(LedgerError::InsufficientFunds {
            account_id: account_id.clone(),
            requested: amount.value(),
            available: balance,
        });
    }
    Ok(balance - amount.value())
}
