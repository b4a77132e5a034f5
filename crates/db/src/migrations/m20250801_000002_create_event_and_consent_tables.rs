//! Create event and consent tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Event::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Event::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Event::SchoolId).string_len(32).not_null())
                    .col(ColumnDef::new(Event::Title).string_len(256).not_null())
                    .col(
                        ColumnDef::new(Event::StartsAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Event::RequiresConsent)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Event::ConsentDeadline).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Event::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_school")
                            .from(Event::Table, Event::SchoolId)
                            .to(School::Table, School::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_event_school_id")
                    .table(Event::Table)
                    .col(Event::SchoolId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Consent::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Consent::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Consent::EventId).string_len(32).not_null())
                    .col(ColumnDef::new(Consent::StudentId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Consent::ResponsibleId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Consent::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending")
                            .check(
                                Expr::col(Consent::Status)
                                    .is_in(["pending", "approved", "denied", "expired"]),
                            ),
                    )
                    .col(ColumnDef::new(Consent::Notes).text())
                    .col(
                        ColumnDef::new(Consent::RequestedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Consent::ApprovedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Consent::DeniedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Consent::ExpiresAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Consent::Version)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_consent_event")
                            .from(Consent::Table, Consent::EventId)
                            .to(Event::Table, Event::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_consent_student")
                            .from(Consent::Table, Consent::StudentId)
                            .to(Student::Table, Student::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique: one consent per (event, student)
        manager
            .create_index(
                Index::create()
                    .name("idx_consent_event_student_unique")
                    .table(Consent::Table)
                    .col(Consent::EventId)
                    .col(Consent::StudentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: responsible_id (for guardian inbox queries)
        manager
            .create_index(
                Index::create()
                    .name("idx_consent_responsible_id")
                    .table(Consent::Table)
                    .col(Consent::ResponsibleId)
                    .to_owned(),
            )
            .await?;

        // Index: (status, expires_at) (for the expiry sweep)
        manager
            .create_index(
                Index::create()
                    .name("idx_consent_status_expires_at")
                    .table(Consent::Table)
                    .col(Consent::Status)
                    .col(Consent::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Consent::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Event::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Event {
    Table,
    Id,
    SchoolId,
    Title,
    StartsAt,
    RequiresConsent,
    ConsentDeadline,
    CreatedAt,
}

#[derive(Iden)]
enum Consent {
    Table,
    Id,
    EventId,
    StudentId,
    ResponsibleId,
    Status,
    Notes,
    RequestedAt,
    ApprovedAt,
    DeniedAt,
    ExpiresAt,
    Version,
}

#[derive(Iden)]
enum School {
    Table,
    Id,
}

#[derive(Iden)]
enum Student {
    Table,
    Id,
}
