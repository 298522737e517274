//! Transaction primitives.
//!
//! A `Transaction` records one successful business operation (spend, top-up
//! or bonus) together with the client-supplied idempotency key that
//! deduplicates retransmissions. Failed attempts are never persisted, so the
//! only status a stored transaction can carry is `SUCCESS`.
//!
//! Rows are written exactly once and never updated or deleted.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, ResultLedger};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Spend,
    TopUp,
    Bonus,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Spend => "SPEND",
            Self::TopUp => "TOPUP",
            Self::Bonus => "BONUS",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "SPEND" => Ok(Self::Spend),
            "TOPUP" => Ok(Self::TopUp),
            "BONUS" => Ok(Self::Bonus),
            other => Err(LedgerError::Validation(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Success,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
        }
    }
}

impl TryFrom<&str> for TransactionStatus {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "SUCCESS" => Ok(Self::Success),
            other => Err(LedgerError::Validation(format!(
                "invalid transaction status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    pub idempotency_key: String,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(kind: TransactionKind, idempotency_key: String) -> ResultLedger<Self> {
        if idempotency_key.trim().is_empty() {
            return Err(LedgerError::Validation(
                "idempotency key must not be empty".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            kind,
            status: TransactionStatus::Success,
            idempotency_key,
            created_at: Utc::now(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub kind: String,
    pub status: String,
    #[sea_orm(unique)]
    pub idempotency_key: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ledger_entries::Entity")]
    LedgerEntries,
}

impl Related<super::ledger_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            status: ActiveValue::Set(tx.status.as_str().to_string()),
            idempotency_key: ActiveValue::Set(tx.idempotency_key.clone()),
            created_at: ActiveValue::Set(tx.created_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::Validation("invalid transaction id".to_string()))?,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            status: TransactionStatus::try_from(model.status.as_str())?,
            idempotency_key: model.idempotency_key,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_transaction_rejects_blank_key() {
        let err = Transaction::new(TransactionKind::Spend, "  ".to_string()).unwrap_err();
        assert_eq!(
            err,
            LedgerError::Validation("idempotency key must not be empty".to_string())
        );
    }

    #[test]
    fn kind_round_trips_through_str() {
        for kind in [
            TransactionKind::Spend,
            TransactionKind::TopUp,
            TransactionKind::Bonus,
        ] {
            assert_eq!(TransactionKind::try_from(kind.as_str()).unwrap(), kind);
        }
    }
}
