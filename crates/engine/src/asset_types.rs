//! Asset types.
//!
//! An `AssetType` is a named unit of account (a point currency). Wallet
//! balances and ledger entry amounts are integer counts of one asset type.
//! Asset types are immutable after creation.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::LedgerError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetType {
    pub id: Uuid,
    pub name: String,
}

impl AssetType {
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "asset_types")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::wallets::Entity")]
    Wallets,
}

impl Related<super::wallets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&AssetType> for ActiveModel {
    fn from(asset: &AssetType) -> Self {
        Self {
            id: ActiveValue::Set(asset.id.to_string()),
            name: ActiveValue::Set(asset.name.clone()),
        }
    }
}

impl TryFrom<Model> for AssetType {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::Validation("invalid asset type id".to_string()))?,
            name: model.name,
        })
    }
}
