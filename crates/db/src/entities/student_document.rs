//! Student compliance document entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Review status of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[derive(Default)]
pub enum DocumentStatus {
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Requires a rejection reason.
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// An uploaded compliance document awaiting staff review.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "student_document")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Student the document belongs to.
    #[sea_orm(indexed)]
    pub student_id: String,

    /// Kind of document (vaccination card, transfer record, ...).
    pub document_type: String,

    /// Current review status.
    pub status: DocumentStatus,

    /// Why the document was rejected; mandatory on rejection.
    #[sea_orm(column_type = "Text", nullable)]
    pub rejection_reason: Option<String>,

    /// Staff member who reviewed the document.
    #[sea_orm(nullable)]
    pub reviewed_by: Option<String>,

    /// When the review happened. Stamped together with the status write.
    #[sea_orm(nullable)]
    pub reviewed_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    /// Optimistic concurrency version, bumped on every write.
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id"
    )]
    Student,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
