//! SmallBank Common Types
//!
//! Shared types used across the SmallBank ledger: account and transaction
//! identifiers, validated monetary amounts, and the ledger error taxonomy.

pub mod identifiers;
pub mod monetary;
pub mod error;
pub mod time;

pub use identifiers::*;
pub use monetary::*;
pub use error::*;
pub use time::*;
