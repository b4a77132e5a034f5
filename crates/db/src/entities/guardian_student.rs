//! Guardian-student link entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Links a guardian ("responsável") account to a student, with the
/// per-student permission flags that gate what the guardian may see
/// and which guardian may answer consents.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "guardian_student")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Guardian account ID.
    #[sea_orm(indexed)]
    pub guardian_id: String,

    /// Student this guardian is responsible for.
    #[sea_orm(indexed)]
    pub student_id: String,

    /// Whether this guardian is the primary responsible party.
    ///
    /// Only the primary guardian may answer consents for the student.
    pub is_primary: bool,

    /// Whether this guardian may view billing and wallet data.
    pub can_view_finance: bool,

    /// Whether this guardian may view grades and attendance.
    pub can_view_pedagogical: bool,

    pub created_at: DateTimeWithTimeZone,
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
