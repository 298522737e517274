//! The module contains the errors the engine can throw.
//!
//! Business-rule and not-found failures abort the enclosing database
//! transaction with no partial writes. Store-level contention is carried
//! inside [`Database`] and recovered by the retry policy in
//! [`retry`](crate::retry); anything else in [`Database`] is fatal.
//!
//!  [`Database`]: LedgerError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Ledger engine custom errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Wallet \"{0}\" not found!")]
    WalletNotFound(String),
    #[error("No treasury wallet for asset type \"{0}\"!")]
    TreasuryNotFound(String),
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for LedgerError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::WalletNotFound(a), Self::WalletNotFound(b)) => a == b,
            (Self::TreasuryNotFound(a), Self::TreasuryNotFound(b)) => a == b,
            (Self::InsufficientBalance(a), Self::InsufficientBalance(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
