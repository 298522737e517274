pub use asset_types::AssetType;
pub use error::LedgerError;
pub use ledger_entries::LedgerEntry;
pub use ops::{BalanceView, Engine, Receipt};
pub use retry::{DEFAULT_MAX_RETRIES, with_retry};
pub use transactions::{Transaction, TransactionKind, TransactionStatus};
pub use wallets::Wallet;

mod asset_types;
mod error;
mod ledger_entries;
mod ops;
mod retry;
mod transactions;
mod wallets;

type ResultLedger<T> = Result<T, LedgerError>;
