//! Initial schema migration - creates all tables from scratch.
//!
//! Tables:
//!
//! - `asset_types`: units of account (point currencies)
//! - `wallets`: balance holders; `owner_id IS NULL` marks the treasury
//! - `transactions`: one row per successful business operation, with the
//!   globally unique client-supplied idempotency key
//! - `ledger_entries`: immutable signed movements, one wallet each
//!
//! The unique index on `transactions.idempotency_key` is the mechanism the
//! idempotency guard relies on: a race between two inserts of the same key
//! always resolves to exactly one winner.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum AssetTypes {
    Table,
    Id,
    Name,
}

#[derive(Iden)]
enum Wallets {
    Table,
    Id,
    OwnerId,
    AssetTypeId,
    Balance,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    Kind,
    Status,
    IdempotencyKey,
    CreatedAt,
}

#[derive(Iden)]
enum LedgerEntries {
    Table,
    Id,
    TransactionId,
    WalletId,
    Amount,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AssetTypes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AssetTypes::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AssetTypes::Name).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Wallets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Wallets::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Wallets::OwnerId).string())
                    .col(ColumnDef::new(Wallets::AssetTypeId).string().not_null())
                    .col(ColumnDef::new(Wallets::Balance).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-wallets-asset_type_id")
                            .from(Wallets::Table, Wallets::AssetTypeId)
                            .to(AssetTypes::Table, AssetTypes::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Treasury resolution filters on (asset_type_id, owner_id IS NULL).
        manager
            .create_index(
                Index::create()
                    .name("idx-wallets-asset_type_id")
                    .table(Wallets::Table)
                    .col(Wallets::AssetTypeId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::Kind).string().not_null())
                    .col(ColumnDef::new(Transactions::Status).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::IdempotencyKey)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-transactions-idempotency_key")
                    .table(Transactions::Table)
                    .col(Transactions::IdempotencyKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LedgerEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LedgerEntries::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LedgerEntries::TransactionId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LedgerEntries::WalletId).string().not_null())
                    .col(
                        ColumnDef::new(LedgerEntries::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LedgerEntries::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ledger_entries-transaction_id")
                            .from(LedgerEntries::Table, LedgerEntries::TransactionId)
                            .to(Transactions::Table, Transactions::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ledger_entries-wallet_id")
                            .from(LedgerEntries::Table, LedgerEntries::WalletId)
                            .to(Wallets::Table, Wallets::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledger_entries-wallet_id")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::WalletId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledger_entries-transaction_id")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::TransactionId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LedgerEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Wallets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AssetTypes::Table).to_owned())
            .await?;

        Ok(())
    }
}
