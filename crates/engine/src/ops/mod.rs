use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::{LedgerError, ResultLedger};

mod balances;
mod transfers;
mod wallets;

pub use balances::BalanceView;
pub use transfers::Receipt;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

fn parse_wallet_id(raw: &str) -> ResultLedger<Uuid> {
    // Wallet ids are always engine-minted UUIDs, so a string that does not
    // parse cannot name an existing wallet.
    Uuid::parse_str(raw).map_err(|_| LedgerError::WalletNotFound(raw.to_string()))
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> ResultLedger<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}
