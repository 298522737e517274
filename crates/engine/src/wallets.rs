//! The module contains the `Wallet` struct and its entity model.
//!
//! A wallet holds an integer balance of one asset type. A wallet with no
//! owner is the *treasury* wallet for its asset type: the counterparty that
//! funds every top-up and bonus. There is at most one treasury per asset
//! type, enforced at creation time.
//!
//! The `balance` column is denormalized: it always equals the wallet's
//! opening balance plus the sum of its ledger entry amounts. It is only ever
//! mutated inside a locked database transaction.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::LedgerError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Stable identifier, generated once and persisted as a string.
    pub id: Uuid,
    /// `None` marks the treasury wallet of the asset type.
    pub owner_id: Option<String>,
    pub asset_type_id: Uuid,
    pub balance: i64,
}

impl Wallet {
    pub fn new(owner_id: Option<String>, asset_type_id: Uuid, balance: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            asset_type_id,
            balance,
        }
    }

    pub fn is_treasury(&self) -> bool {
        self.owner_id.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub owner_id: Option<String>,
    pub asset_type_id: String,
    pub balance: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ledger_entries::Entity")]
    LedgerEntries,
    #[sea_orm(
        belongs_to = "super::asset_types::Entity",
        from = "Column::AssetTypeId",
        to = "super::asset_types::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    AssetTypes,
}

impl Related<super::ledger_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerEntries.def()
    }
}

impl Related<super::asset_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AssetTypes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Wallet> for ActiveModel {
    fn from(wallet: &Wallet) -> Self {
        Self {
            id: ActiveValue::Set(wallet.id.to_string()),
            owner_id: ActiveValue::Set(wallet.owner_id.clone()),
            asset_type_id: ActiveValue::Set(wallet.asset_type_id.to_string()),
            balance: ActiveValue::Set(wallet.balance),
        }
    }
}

impl TryFrom<Model> for Wallet {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::WalletNotFound(model.id.clone()))?,
            owner_id: model.owner_id,
            asset_type_id: Uuid::parse_str(&model.asset_type_id)
                .map_err(|_| LedgerError::Validation("invalid asset type id".to_string()))?,
            balance: model.balance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unowned_wallet_is_treasury() {
        let asset_type_id = Uuid::new_v4();
        let treasury = Wallet::new(None, asset_type_id, 0);
        let user = Wallet::new(Some("user-1".to_string()), asset_type_id, 100);

        assert!(treasury.is_treasury());
        assert!(!user.is_treasury());
    }

    #[test]
    fn model_round_trips_to_wallet() {
        let wallet = Wallet::new(Some("user-1".to_string()), Uuid::new_v4(), 250);
        let model = Model {
            id: wallet.id.to_string(),
            owner_id: wallet.owner_id.clone(),
            asset_type_id: wallet.asset_type_id.to_string(),
            balance: wallet.balance,
        };

        assert_eq!(Wallet::try_from(model).unwrap(), wallet);
    }
}
