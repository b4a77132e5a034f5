//! Print request entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Status of a print request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[derive(Default)]
pub enum PrintRequestStatus {
    /// Submitted and awaiting an approver.
    #[sea_orm(string_value = "requested")]
    #[default]
    Requested,
    /// Cleared for printing.
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Declined by the approver. Requires feedback.
    #[sea_orm(string_value = "rejected")]
    Rejected,
    /// Job completed.
    #[sea_orm(string_value = "printed")]
    Printed,
    /// Sent back to the requester for edits; returns to `Requested`.
    #[sea_orm(string_value = "review")]
    Review,
}

/// A document print job submitted by school staff.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "print_request")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// User who submitted the request.
    #[sea_orm(indexed)]
    pub requester_id: String,

    /// School the request belongs to.
    #[sea_orm(indexed)]
    pub school_id: String,

    /// Short description of the job.
    pub title: String,

    /// Copies requested.
    pub quantity: i32,

    /// When the copies are needed.
    pub due_date: DateTimeWithTimeZone,

    /// Duplex printing.
    pub front_and_back: bool,

    /// Current status.
    pub status: PrintRequestStatus,

    /// Approver feedback; mandatory on rejection, also used for review notes.
    #[sea_orm(column_type = "Text", nullable)]
    pub review_feedback: Option<String>,

    /// When the request was approved.
    #[sea_orm(nullable)]
    pub approved_at: Option<DateTimeWithTimeZone>,

    /// When the request was rejected.
    #[sea_orm(nullable)]
    pub rejected_at: Option<DateTimeWithTimeZone>,

    /// When the job was printed.
    #[sea_orm(nullable)]
    pub printed_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    /// Optimistic concurrency version, bumped on every write.
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::school::Entity",
        from = "Column::SchoolId",
        to = "super::school::Column::Id"
    )]
    School,
}

impl Related<super::school::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::School.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
