//! Create canteen tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Canteen::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Canteen::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Canteen::SchoolId).string_len(32).not_null())
                    .col(ColumnDef::new(Canteen::Name).string_len(128).not_null())
                    .col(
                        ColumnDef::new(Canteen::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_canteen_school")
                            .from(Canteen::Table, Canteen::SchoolId)
                            .to(School::Table, School::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CanteenTransaction::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CanteenTransaction::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CanteenTransaction::CanteenId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(CanteenTransaction::StudentId).string_len(32))
                    .col(
                        ColumnDef::new(CanteenTransaction::ItemName)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CanteenTransaction::Quantity)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(CanteenTransaction::Amount)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CanteenTransaction::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_canteen_transaction_canteen")
                            .from(CanteenTransaction::Table, CanteenTransaction::CanteenId)
                            .to(Canteen::Table, Canteen::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (canteen_id, created_at) (for the monthly aggregation window)
        manager
            .create_index(
                Index::create()
                    .name("idx_canteen_transaction_canteen_created")
                    .table(CanteenTransaction::Table)
                    .col(CanteenTransaction::CanteenId)
                    .col(CanteenTransaction::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MonthlyTransfer::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MonthlyTransfer::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MonthlyTransfer::CanteenId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MonthlyTransfer::Month)
                            .integer()
                            .not_null()
                            .check(
                                Expr::col(MonthlyTransfer::Month)
                                    .gte(1)
                                    .and(Expr::col(MonthlyTransfer::Month).lte(12)),
                            ),
                    )
                    .col(ColumnDef::new(MonthlyTransfer::Year).integer().not_null())
                    .col(
                        ColumnDef::new(MonthlyTransfer::TotalAmount)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MonthlyTransfer::TransactionCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(MonthlyTransfer::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending")
                            .check(
                                Expr::col(MonthlyTransfer::Status)
                                    .is_in(["pending", "processing", "completed", "failed"]),
                            ),
                    )
                    .col(ColumnDef::new(MonthlyTransfer::ProcessedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(MonthlyTransfer::ErrorMessage).text())
                    .col(
                        ColumnDef::new(MonthlyTransfer::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(MonthlyTransfer::Version)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_monthly_transfer_canteen")
                            .from(MonthlyTransfer::Table, MonthlyTransfer::CanteenId)
                            .to(Canteen::Table, Canteen::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique: one transfer per (canteen, month, year)
        manager
            .create_index(
                Index::create()
                    .name("idx_monthly_transfer_period_unique")
                    .table(MonthlyTransfer::Table)
                    .col(MonthlyTransfer::CanteenId)
                    .col(MonthlyTransfer::Year)
                    .col(MonthlyTransfer::Month)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MonthlyTransfer::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CanteenTransaction::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Canteen::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Canteen {
    Table,
    Id,
    SchoolId,
    Name,
    CreatedAt,
}

#[derive(Iden)]
enum CanteenTransaction {
    Table,
    Id,
    CanteenId,
    StudentId,
    ItemName,
    Quantity,
    Amount,
    CreatedAt,
}

#[derive(Iden)]
enum MonthlyTransfer {
    Table,
    Id,
    CanteenId,
    Month,
    Year,
    TotalAmount,
    TransactionCount,
    Status,
    ProcessedAt,
    ErrorMessage,
    CreatedAt,
    Version,
}

#[derive(Iden)]
enum School {
    Table,
    Id,
}
