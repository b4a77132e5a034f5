//! Create print request and student document tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PrintRequest::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PrintRequest::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PrintRequest::RequesterId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PrintRequest::SchoolId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PrintRequest::Title).string_len(256).not_null())
                    .col(
                        ColumnDef::new(PrintRequest::Quantity)
                            .integer()
                            .not_null()
                            .check(Expr::col(PrintRequest::Quantity).gt(0)),
                    )
                    .col(
                        ColumnDef::new(PrintRequest::DueDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PrintRequest::FrontAndBack)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(PrintRequest::Status)
                            .string_len(16)
                            .not_null()
                            .default("requested")
                            .check(Expr::col(PrintRequest::Status).is_in([
                                "requested",
                                "approved",
                                "rejected",
                                "printed",
                                "review",
                            ])),
                    )
                    .col(ColumnDef::new(PrintRequest::ReviewFeedback).text())
                    .col(ColumnDef::new(PrintRequest::ApprovedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(PrintRequest::RejectedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(PrintRequest::PrintedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(PrintRequest::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(PrintRequest::Version)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_print_request_school")
                            .from(PrintRequest::Table, PrintRequest::SchoolId)
                            .to(School::Table, School::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_print_request_school_status")
                    .table(PrintRequest::Table)
                    .col(PrintRequest::SchoolId)
                    .col(PrintRequest::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_print_request_requester_id")
                    .table(PrintRequest::Table)
                    .col(PrintRequest::RequesterId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StudentDocument::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StudentDocument::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(StudentDocument::StudentId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StudentDocument::DocumentType)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StudentDocument::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending")
                            .check(
                                Expr::col(StudentDocument::Status)
                                    .is_in(["pending", "approved", "rejected"]),
                            ),
                    )
                    .col(ColumnDef::new(StudentDocument::RejectionReason).text())
                    .col(ColumnDef::new(StudentDocument::ReviewedBy).string_len(32))
                    .col(ColumnDef::new(StudentDocument::ReviewedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(StudentDocument::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(StudentDocument::Version)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_student_document_student")
                            .from(StudentDocument::Table, StudentDocument::StudentId)
                            .to(Student::Table, Student::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_student_document_student_status")
                    .table(StudentDocument::Table)
                    .col(StudentDocument::StudentId)
                    .col(StudentDocument::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StudentDocument::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PrintRequest::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PrintRequest {
    Table,
    Id,
    RequesterId,
    SchoolId,
    Title,
    Quantity,
    DueDate,
    FrontAndBack,
    Status,
    ReviewFeedback,
    ApprovedAt,
    RejectedAt,
    PrintedAt,
    CreatedAt,
    Version,
}

#[derive(Iden)]
enum StudentDocument {
    Table,
    Id,
    StudentId,
    DocumentType,
    Status,
    RejectionReason,
    ReviewedBy,
    ReviewedAt,
    CreatedAt,
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
