//! Provisioning operations: asset types and wallets.
//!
//! These exist so deployments and tests can build a working ledger without
//! reaching into the store by hand. Wallets may carry an opening balance at
//! creation; from then on every balance change goes through a transaction
//! with ledger entries.

use sea_orm::{QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{AssetType, LedgerError, ResultLedger, Wallet, asset_types, wallets};

use super::{Engine, with_tx};

impl Engine {
    /// Creates a new asset type (a named unit of account).
    pub async fn create_asset_type(&self, name: &str) -> ResultLedger<Uuid> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::Validation(
                "asset type name must not be empty".to_string(),
            ));
        }

        let asset = AssetType::new(name.to_string());
        asset_types::ActiveModel::from(&asset)
            .insert(&self.database)
            .await?;
        Ok(asset.id)
    }

    /// Creates the treasury wallet for an asset type.
    ///
    /// At most one unowned wallet may exist per asset type; a second call
    /// for the same asset type fails without writing anything.
    pub async fn create_treasury(
        &self,
        asset_type_id: Uuid,
        opening_balance: i64,
    ) -> ResultLedger<Uuid> {
        with_tx!(self, |db_tx| {
            self.require_asset_type(&db_tx, asset_type_id).await?;

            let existing = wallets::Entity::find()
                .filter(wallets::Column::AssetTypeId.eq(asset_type_id.to_string()))
                .filter(wallets::Column::OwnerId.is_null())
                .one(&db_tx)
                .await?;
            if existing.is_some() {
                return Err(LedgerError::Validation(format!(
                    "a treasury wallet already exists for asset type {asset_type_id}"
                )));
            }

            let wallet = Wallet::new(None, asset_type_id, opening_balance);
            wallets::ActiveModel::from(&wallet).insert(&db_tx).await?;
            Ok(wallet.id)
        })
    }

    /// Creates a user wallet with an opening balance.
    pub async fn create_wallet(
        &self,
        owner_id: &str,
        asset_type_id: Uuid,
        opening_balance: i64,
    ) -> ResultLedger<Uuid> {
        let owner_id = owner_id.trim();
        if owner_id.is_empty() {
            return Err(LedgerError::Validation(
                "owner id must not be empty".to_string(),
            ));
        }
        if opening_balance < 0 {
            return Err(LedgerError::Validation(
                "opening balance must not be negative".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            self.require_asset_type(&db_tx, asset_type_id).await?;

            let wallet = Wallet::new(Some(owner_id.to_string()), asset_type_id, opening_balance);
            wallets::ActiveModel::from(&wallet).insert(&db_tx).await?;
            Ok(wallet.id)
        })
    }

    /// Returns a wallet snapshot from the store.
    pub async fn wallet(&self, wallet_id: &str) -> ResultLedger<Wallet> {
        let wallet_id = super::parse_wallet_id(wallet_id)?;
        let model = wallets::Entity::find_by_id(wallet_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| LedgerError::WalletNotFound(wallet_id.to_string()))?;
        Wallet::try_from(model)
    }

    async fn require_asset_type(
        &self,
        db_tx: &sea_orm::DatabaseTransaction,
        asset_type_id: Uuid,
    ) -> ResultLedger<()> {
        asset_types::Entity::find_by_id(asset_type_id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| {
                LedgerError::Validation(format!("asset type {asset_type_id} not found"))
            })?;
        Ok(())
    }
}
