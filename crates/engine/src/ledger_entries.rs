//! Ledger entries.
//!
//! A [`LedgerEntry`] is a single immutable movement of value on one wallet,
//! owned by one [`Transaction`](crate::Transaction). Amounts are signed
//! integer asset units:
//! - positive values credit the wallet
//! - negative values debit the wallet
//!
//! Top-ups and bonuses write two entries that sum to zero (the double-entry
//! invariant); spends write a single debit entry. Entries are never updated
//! or deleted, so a wallet's balance can always be rebuilt by summing them.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::LedgerError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub wallet_id: Uuid,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn new(transaction_id: Uuid, wallet_id: Uuid, amount: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            transaction_id,
            wallet_id,
            amount,
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub transaction_id: String,
    pub wallet_id: String,
    pub amount: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transactions::Entity",
        from = "Column::TransactionId",
        to = "super::transactions::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Transactions,
    #[sea_orm(
        belongs_to = "super::wallets::Entity",
        from = "Column::WalletId",
        to = "super::wallets::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Wallets,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::wallets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&LedgerEntry> for ActiveModel {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            transaction_id: ActiveValue::Set(entry.transaction_id.to_string()),
            wallet_id: ActiveValue::Set(entry.wallet_id.to_string()),
            amount: ActiveValue::Set(entry.amount),
            created_at: ActiveValue::Set(entry.created_at),
        }
    }
}

impl TryFrom<Model> for LedgerEntry {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::Validation("invalid ledger entry id".to_string()))?,
            transaction_id: Uuid::parse_str(&model.transaction_id)
                .map_err(|_| LedgerError::Validation("invalid transaction id".to_string()))?,
            wallet_id: Uuid::parse_str(&model.wallet_id)
                .map_err(|_| LedgerError::WalletNotFound(model.wallet_id.clone()))?,
            amount: model.amount,
            created_at: model.created_at,
        })
    }
}
