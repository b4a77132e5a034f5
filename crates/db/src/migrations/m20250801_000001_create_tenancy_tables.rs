//! Create tenancy tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SchoolChain::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SchoolChain::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SchoolChain::Name).string_len(256).not_null())
                    .col(
                        ColumnDef::new(SchoolChain::CreatedAt)
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
                    .table(School::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(School::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(School::SchoolChainId).string_len(32))
                    .col(ColumnDef::new(School::Name).string_len(256).not_null())
                    .col(
                        ColumnDef::new(School::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_school_chain")
                            .from(School::Table, School::SchoolChainId)
                            .to(SchoolChain::Table, SchoolChain::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_school_chain_id")
                    .table(School::Table)
                    .col(School::SchoolChainId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Student::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Student::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Student::SchoolId).string_len(32).not_null())
                    .col(ColumnDef::new(Student::Name).string_len(256).not_null())
                    .col(
                        ColumnDef::new(Student::EnrolledAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_student_school")
                            .from(Student::Table, Student::SchoolId)
                            .to(School::Table, School::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_student_school_id")
                    .table(Student::Table)
                    .col(Student::SchoolId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GuardianStudent::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GuardianStudent::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GuardianStudent::GuardianId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GuardianStudent::StudentId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GuardianStudent::IsPrimary)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(GuardianStudent::CanViewFinance)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(GuardianStudent::CanViewPedagogical)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(GuardianStudent::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_guardian_student_student")
                            .from(GuardianStudent::Table, GuardianStudent::StudentId)
                            .to(Student::Table, Student::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique: one link row per (guardian, student)
        manager
            .create_index(
                Index::create()
                    .name("idx_guardian_student_unique")
                    .table(GuardianStudent::Table)
                    .col(GuardianStudent::GuardianId)
                    .col(GuardianStudent::StudentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_guardian_student_student_id")
                    .table(GuardianStudent::Table)
                    .col(GuardianStudent::StudentId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GuardianStudent::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Student::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(School::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SchoolChain::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum SchoolChain {
    Table,
    Id,
    Name,
    CreatedAt,
}

#[derive(Iden)]
enum School {
    Table,
    Id,
    SchoolChainId,
    Name,
    CreatedAt,
}

#[derive(Iden)]
enum Student {
    Table,
    Id,
    SchoolId,
    Name,
    EnrolledAt,
}

#[derive(Iden)]
enum GuardianStudent {
    Table,
    Id,
    GuardianId,
    StudentId,
    IsPrimary,
    CanViewFinance,
    CanViewPedagogical,
    CreatedAt,
}
