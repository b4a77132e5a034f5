//! Parental consent entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Status of a consent request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[derive(Default)]
pub enum ConsentStatus {
    /// Awaiting an answer from the responsible guardian.
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    /// Authorized by the responsible guardian.
    #[sea_orm(string_value = "approved")]
    Approved,
    /// Declined by the responsible guardian.
    #[sea_orm(string_value = "denied")]
    Denied,
    /// Deadline passed without an answer.
    #[sea_orm(string_value = "expired")]
    Expired,
}

/// A guardian's authorization for a student's participation in an event.
///
/// Once the status leaves `Pending`, exactly one of `approved_at` /
/// `denied_at` is set and the row is immutable apart from reads.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "consent")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Event the consent is for.
    #[sea_orm(indexed)]
    pub event_id: String,

    /// Student whose participation is being authorized.
    #[sea_orm(indexed)]
    pub student_id: String,

    /// Guardian designated to answer this consent.
    #[sea_orm(indexed)]
    pub responsible_id: String,

    /// Current status.
    pub status: ConsentStatus,

    /// Free-form notes from the guardian.
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,

    /// When the consent request was created.
    pub requested_at: DateTimeWithTimeZone,

    /// When the consent was approved.
    #[sea_orm(nullable)]
    pub approved_at: Option<DateTimeWithTimeZone>,

    /// When the consent was denied.
    #[sea_orm(nullable)]
    pub denied_at: Option<DateTimeWithTimeZone>,

    /// Deadline after which a pending consent expires.
    #[sea_orm(nullable)]
    pub expires_at: Option<DateTimeWithTimeZone>,

    /// Optimistic concurrency version, bumped on every write.
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::event::Entity",
        from = "Column::EventId",
        to = "super::event::Column::Id"
    )]
    Event,
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id"
    )]
    Student,
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
