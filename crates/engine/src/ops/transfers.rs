//! Money-movement operations: spend, top-up and bonus.
//!
//! Each operation is one atomic database transaction wrapped by the retry
//! policy. The shape is always the same:
//!
//! 1. replay check on the idempotency key
//! 2. exclusive row lock(s) on the affected wallet(s)
//! 3. business check against the *locked* balance
//! 4. transaction row + ledger entries + balance update
//! 5. commit
//!
//! When two wallets must be locked (top-up/bonus touch the treasury and the
//! target), the rows are requested in a single statement ordered by wallet
//! id. Every concurrent operation asks for the same pair in the same order,
//! so no waiting cycle between transactions can form. Any future operation
//! that locks more than one wallet must use [`Engine::lock_wallet_pair`] for
//! the same reason.

use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    LedgerError, LedgerEntry, ResultLedger, Transaction, TransactionKind, ledger_entries,
    retry::{DEFAULT_MAX_RETRIES, with_retry},
    transactions, wallets,
};

use super::{Engine, parse_wallet_id, with_tx};

/// Outcome of a successful money-movement operation.
///
/// `replayed` is true when the idempotency key matched an already recorded
/// transaction; in that case `transaction_id` is the original one and
/// `new_balance` is the wallet's current balance, with no new effects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub transaction_id: Uuid,
    pub new_balance: i64,
    pub replayed: bool,
}

fn validate_movement(amount: i64, idempotency_key: &str) -> ResultLedger<()> {
    if amount <= 0 {
        return Err(LedgerError::Validation(
            "amount must be a positive integer".to_string(),
        ));
    }
    if idempotency_key.trim().is_empty() {
        return Err(LedgerError::Validation(
            "idempotency key must not be empty".to_string(),
        ));
    }
    Ok(())
}

impl Engine {
    /// Debits `amount` units from a wallet.
    ///
    /// Fails with [`LedgerError::InsufficientBalance`] when the locked
    /// balance is below `amount`; nothing is written in that case.
    pub async fn spend(
        &self,
        wallet_id: &str,
        amount: i64,
        idempotency_key: &str,
    ) -> ResultLedger<Receipt> {
        validate_movement(amount, idempotency_key)?;
        let wallet_id = parse_wallet_id(wallet_id)?;
        with_retry(DEFAULT_MAX_RETRIES, || {
            self.spend_once(wallet_id, amount, idempotency_key)
        })
        .await
    }

    /// Moves `amount` units from the treasury to a wallet, recording a paid
    /// deposit.
    pub async fn top_up(
        &self,
        wallet_id: &str,
        amount: i64,
        idempotency_key: &str,
    ) -> ResultLedger<Receipt> {
        validate_movement(amount, idempotency_key)?;
        let wallet_id = parse_wallet_id(wallet_id)?;
        with_retry(DEFAULT_MAX_RETRIES, || {
            self.treasury_transfer_once(TransactionKind::TopUp, wallet_id, amount, idempotency_key)
        })
        .await
    }

    /// Moves `amount` units from the treasury to a wallet, recording a grant.
    ///
    /// Same mechanics as [`Engine::top_up`]; only the recorded transaction
    /// kind differs.
    pub async fn bonus(
        &self,
        wallet_id: &str,
        amount: i64,
        idempotency_key: &str,
    ) -> ResultLedger<Receipt> {
        validate_movement(amount, idempotency_key)?;
        let wallet_id = parse_wallet_id(wallet_id)?;
        with_retry(DEFAULT_MAX_RETRIES, || {
            self.treasury_transfer_once(TransactionKind::Bonus, wallet_id, amount, idempotency_key)
        })
        .await
    }

    async fn spend_once(
        &self,
        wallet_id: Uuid,
        amount: i64,
        idempotency_key: &str,
    ) -> ResultLedger<Receipt> {
        with_tx!(self, |db_tx| {
            if let Some(receipt) = self.find_replay(&db_tx, wallet_id, idempotency_key).await? {
                Ok(receipt)
            } else {
                let wallet = self.lock_wallet(&db_tx, wallet_id).await?;
                if wallet.balance < amount {
                    return Err(LedgerError::InsufficientBalance(format!(
                        "wallet {wallet_id} holds {}, requested {amount}",
                        wallet.balance
                    )));
                }

                let tx = Transaction::new(TransactionKind::Spend, idempotency_key.to_string())?;
                transactions::ActiveModel::from(&tx).insert(&db_tx).await?;

                let entry = LedgerEntry::new(tx.id, wallet_id, -amount);
                ledger_entries::ActiveModel::from(&entry)
                    .insert(&db_tx)
                    .await?;

                let new_balance = wallet.balance - amount;
                self.update_balance(&db_tx, wallet_id, new_balance).await?;

                Ok(Receipt {
                    transaction_id: tx.id,
                    new_balance,
                    replayed: false,
                })
            }
        })
    }

    async fn treasury_transfer_once(
        &self,
        kind: TransactionKind,
        wallet_id: Uuid,
        amount: i64,
        idempotency_key: &str,
    ) -> ResultLedger<Receipt> {
        with_tx!(self, |db_tx| {
            if let Some(receipt) = self.find_replay(&db_tx, wallet_id, idempotency_key).await? {
                Ok(receipt)
            } else {
                // Unlocked reads, only to resolve the pair of ids. The
                // balances read here are discarded; the locked rows below are
                // the authoritative ones.
                let target = wallets::Entity::find_by_id(wallet_id.to_string())
                    .one(&db_tx)
                    .await?
                    .ok_or_else(|| LedgerError::WalletNotFound(wallet_id.to_string()))?;
                let treasury = wallets::Entity::find()
                    .filter(wallets::Column::AssetTypeId.eq(target.asset_type_id.clone()))
                    .filter(wallets::Column::OwnerId.is_null())
                    .one(&db_tx)
                    .await?
                    .ok_or_else(|| LedgerError::TreasuryNotFound(target.asset_type_id.clone()))?;
                if treasury.id == target.id {
                    return Err(LedgerError::Validation(
                        "the treasury wallet cannot be the target of a top-up or bonus"
                            .to_string(),
                    ));
                }
                let treasury_id = parse_wallet_id(&treasury.id)?;

                let (treasury, target) = self
                    .lock_wallet_pair(&db_tx, treasury_id, wallet_id)
                    .await?;

                let tx = Transaction::new(kind, idempotency_key.to_string())?;
                transactions::ActiveModel::from(&tx).insert(&db_tx).await?;

                for entry in [
                    LedgerEntry::new(tx.id, treasury_id, -amount),
                    LedgerEntry::new(tx.id, wallet_id, amount),
                ] {
                    ledger_entries::ActiveModel::from(&entry)
                        .insert(&db_tx)
                        .await?;
                }

                // The treasury is an issuing authority and may go negative;
                // its balance is intentionally not checked against a floor.
                self.update_balance(&db_tx, treasury_id, treasury.balance - amount)
                    .await?;
                let new_balance = target.balance + amount;
                self.update_balance(&db_tx, wallet_id, new_balance).await?;

                Ok(Receipt {
                    transaction_id: tx.id,
                    new_balance,
                    replayed: false,
                })
            }
        })
    }

    /// Looks up an already recorded transaction for this idempotency key.
    ///
    /// Replays never re-validate business rules; the recorded result is
    /// canonical and the wallet's current balance is returned as-is.
    async fn find_replay(
        &self,
        db_tx: &DatabaseTransaction,
        wallet_id: Uuid,
        idempotency_key: &str,
    ) -> ResultLedger<Option<Receipt>> {
        let existing = transactions::Entity::find()
            .filter(transactions::Column::IdempotencyKey.eq(idempotency_key))
            .one(db_tx)
            .await?;
        let Some(existing) = existing else {
            return Ok(None);
        };

        let wallet = wallets::Entity::find_by_id(wallet_id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| LedgerError::WalletNotFound(wallet_id.to_string()))?;

        let transaction_id = Uuid::parse_str(&existing.id)
            .map_err(|_| LedgerError::Validation("invalid transaction id".to_string()))?;
        Ok(Some(Receipt {
            transaction_id,
            new_balance: wallet.balance,
            replayed: true,
        }))
    }

    /// Acquires an exclusive row lock on one wallet and returns the locked
    /// row, which is the only balance read that may be trusted for a write.
    async fn lock_wallet(
        &self,
        db_tx: &DatabaseTransaction,
        wallet_id: Uuid,
    ) -> ResultLedger<wallets::Model> {
        wallets::Entity::find_by_id(wallet_id.to_string())
            .lock_exclusive()
            .one(db_tx)
            .await?
            .ok_or_else(|| LedgerError::WalletNotFound(wallet_id.to_string()))
    }

    /// Locks two wallet rows in one statement, in ascending id order.
    ///
    /// The canonical order is what makes concurrent pair-locks deadlock-free:
    /// whichever transaction gets there first holds both rows before the
    /// other starts waiting.
    async fn lock_wallet_pair(
        &self,
        db_tx: &DatabaseTransaction,
        first: Uuid,
        second: Uuid,
    ) -> ResultLedger<(wallets::Model, wallets::Model)> {
        let first_id = first.to_string();
        let second_id = second.to_string();
        let rows = wallets::Entity::find()
            .filter(wallets::Column::Id.is_in([first_id.clone(), second_id.clone()]))
            .order_by_asc(wallets::Column::Id)
            .lock_exclusive()
            .all(db_tx)
            .await?;

        let mut first_row = None;
        let mut second_row = None;
        for row in rows {
            if row.id == first_id {
                first_row = Some(row);
            } else if row.id == second_id {
                second_row = Some(row);
            }
        }

        let first_row = first_row.ok_or_else(|| LedgerError::WalletNotFound(first.to_string()))?;
        let second_row =
            second_row.ok_or_else(|| LedgerError::WalletNotFound(second.to_string()))?;
        Ok((first_row, second_row))
    }

    async fn update_balance(
        &self,
        db_tx: &DatabaseTransaction,
        wallet_id: Uuid,
        new_balance: i64,
    ) -> ResultLedger<()> {
        let wallet_model = wallets::ActiveModel {
            id: ActiveValue::Set(wallet_id.to_string()),
            balance: ActiveValue::Set(new_balance),
            ..Default::default()
        };
        wallet_model.update(db_tx).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_validation_rejects_bad_input() {
        assert_eq!(
            validate_movement(0, "k").unwrap_err(),
            LedgerError::Validation("amount must be a positive integer".to_string())
        );
        assert_eq!(
            validate_movement(-5, "k").unwrap_err(),
            LedgerError::Validation("amount must be a positive integer".to_string())
        );
        assert_eq!(
            validate_movement(10, "").unwrap_err(),
            LedgerError::Validation("idempotency key must not be empty".to_string())
        );
        assert!(validate_movement(10, "k").is_ok());
    }
}
