//! Create billing tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Plan::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Plan::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Plan::Name).string_len(128).not_null())
                    .col(
                        ColumnDef::new(Plan::PricePerStudent)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Plan::TrialDays)
                            .integer()
                            .not_null()
                            .default(14),
                    )
                    .col(
                        ColumnDef::new(Plan::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Subscription::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Subscription::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    // Exactly one owner: school XOR chain
                    .col(
                        ColumnDef::new(Subscription::SchoolId).string_len(32).check(
                            Expr::col(Subscription::SchoolId)
                                .is_not_null()
                                .and(Expr::col(Subscription::SchoolChainId).is_null())
                                .or(Expr::col(Subscription::SchoolId)
                                    .is_null()
                                    .and(Expr::col(Subscription::SchoolChainId).is_not_null())),
                        ),
                    )
                    .col(ColumnDef::new(Subscription::SchoolChainId).string_len(32))
                    .col(
                        ColumnDef::new(Subscription::PlanId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Subscription::BillingCycle)
                            .string_len(16)
                            .not_null()
                            .default("monthly"),
                    )
                    .col(
                        ColumnDef::new(Subscription::Status)
                            .string_len(16)
                            .not_null()
                            .default("trial")
                            .check(Expr::col(Subscription::Status).is_in([
                                "trial",
                                "active",
                                "past_due",
                                "blocked",
                                "canceled",
                                "paused",
                            ])),
                    )
                    .col(
                        ColumnDef::new(Subscription::MonthlyAmount)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Subscription::ActiveStudents)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Subscription::CurrentPeriodEnd)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Subscription::PausedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Subscription::CanceledAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Subscription::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Subscription::Version)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subscription_school")
                            .from(Subscription::Table, Subscription::SchoolId)
                            .to(School::Table, School::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subscription_chain")
                            .from(Subscription::Table, Subscription::SchoolChainId)
                            .to(SchoolChain::Table, SchoolChain::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subscription_plan")
                            .from(Subscription::Table, Subscription::PlanId)
                            .to(Plan::Table, Plan::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_subscription_school_id")
                    .table(Subscription::Table)
                    .col(Subscription::SchoolId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_subscription_chain_id")
                    .table(Subscription::Table)
                    .col(Subscription::SchoolChainId)
                    .to_owned(),
            )
            .await?;

        // Index: (status, current_period_end) (for the delinquency sweep)
        manager
            .create_index(
                Index::create()
                    .name("idx_subscription_status_period_end")
                    .table(Subscription::Table)
                    .col(Subscription::Status)
                    .col(Subscription::CurrentPeriodEnd)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Invoice::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Invoice::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Invoice::SubscriptionId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Invoice::ReferenceMonth).integer().not_null())
                    .col(ColumnDef::new(Invoice::ReferenceYear).integer().not_null())
                    .col(ColumnDef::new(Invoice::Amount).decimal_len(12, 2).not_null())
                    .col(
                        ColumnDef::new(Invoice::DueDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Invoice::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending")
                            .check(Expr::col(Invoice::Status).is_in([
                                "pending",
                                "paid",
                                "overdue",
                                "canceled",
                                "refunded",
                            ])),
                    )
                    .col(ColumnDef::new(Invoice::PaidAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Invoice::RefundedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Invoice::CanceledAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Invoice::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Invoice::Version)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_invoice_subscription")
                            .from(Invoice::Table, Invoice::SubscriptionId)
                            .to(Subscription::Table, Subscription::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique: one invoice per (subscription, month, year)
        manager
            .create_index(
                Index::create()
                    .name("idx_invoice_subscription_period_unique")
                    .table(Invoice::Table)
                    .col(Invoice::SubscriptionId)
                    .col(Invoice::ReferenceYear)
                    .col(Invoice::ReferenceMonth)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: (status, due_date) (for the overdue sweep)
        manager
            .create_index(
                Index::create()
                    .name("idx_invoice_status_due_date")
                    .table(Invoice::Table)
                    .col(Invoice::Status)
                    .col(Invoice::DueDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Invoice::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Subscription::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Plan::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Plan {
    Table,
    Id,
    Name,
    PricePerStudent,
    TrialDays,
    CreatedAt,
}

#[derive(Iden)]
enum Subscription {
    Table,
    Id,
    SchoolId,
    SchoolChainId,
    PlanId,
    BillingCycle,
    Status,
    MonthlyAmount,
    ActiveStudents,
    CurrentPeriodEnd,
    PausedAt,
    CanceledAt,
    CreatedAt,
    Version,
}

#[derive(Iden)]
enum Invoice {
    Table,
    Id,
    SubscriptionId,
    ReferenceMonth,
    ReferenceYear,
    Amount,
    DueDate,
    Status,
    PaidAt,
    RefundedAt,
    CanceledAt,
    CreatedAt,
    Version,
}

#[derive(Iden)]
enum School {
    Table,
    Id,
}

#[derive(Iden)]
enum SchoolChain {
    Table,
    Id,
}
