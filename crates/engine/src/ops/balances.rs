use sea_orm::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::{LedgerError, ResultLedger, wallets};

use super::{Engine, parse_wallet_id};

/// Point-in-time view of a wallet's balance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BalanceView {
    pub wallet_id: Uuid,
    pub balance: i64,
}

impl Engine {
    /// Returns a wallet's current balance.
    ///
    /// This read takes no lock, so it may observe a balance mid-flight
    /// relative to a concurrent writer. Callers that need a consistent
    /// snapshot should use the balance returned by a write operation instead.
    pub async fn balance(&self, wallet_id: &str) -> ResultLedger<BalanceView> {
        let wallet_id = parse_wallet_id(wallet_id)?;
        let model = wallets::Entity::find_by_id(wallet_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| LedgerError::WalletNotFound(wallet_id.to_string()))?;

        Ok(BalanceView {
            wallet_id,
            balance: model.balance,
        })
    }
}
