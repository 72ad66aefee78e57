//! Monetary types for the SmallBank ledger.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LedgerError;

/// Number of fractional digits a monetary value may carry.
pub const MONEY_SCALE: u32 = 2;

/// Largest balance the ledger can hold (the range of `NUMERIC(15, 2)`).
pub const MAX_BALANCE: Decimal = Decimal::from_parts(2_764_472_319, 232_830, 0, false, 2);

/// A strictly positive amount of money moved by a ledger operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Create a validated amount.
    pub fn new(value: Decimal) -> Result<Self, LedgerError> {
        if value <= Decimal::ZERO {
            return Err(LedgerError::validation_field(
                "amount must be greater than zero",
                "amount",
            ));
        }

        check_scale(value, "amount")?;

        if value > MAX_BALANCE {
            return Err(LedgerError::validation_field(
                format!("amount must not exceed {MAX_BALANCE}"),
                "amount",
            ));
        }

        Ok(Self(value.normalize()))
    }

    /// Get the amount value.
    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = LedgerError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl FromStr for Amount {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim()).map_err(|_| {
            LedgerError::validation_field(format!("invalid amount: {s}"), "amount")
        })?;
        Self::new(value)
    }
}

/// Validate a balance value (zero allowed) for account creation.
pub fn validate_balance(value: Decimal) -> Result<Decimal, LedgerError> {
    if value < Decimal::ZERO {
        return Err(LedgerError::validation_field(
            "balance must not be negative",
            "balance",
        ));
    }

    check_scale(value, "balance")?;

    if value > MAX_BALANCE {
        return Err(LedgerError::validation_field(
            format!("balance must not exceed {MAX_BALANCE}"),
            "balance",
        ));
    }

    Ok(value.normalize())
}

fn check_scale(value: Decimal, field: &str) -> Result<(), LedgerError> {
    if value.normalize().scale() > MONEY_SCALE {
        return Err(LedgerError::validation_field(
            format!("{field} must have at most {MONEY_SCALE} decimal places"),
            field,
        ));
    }
    Ok(())
}
