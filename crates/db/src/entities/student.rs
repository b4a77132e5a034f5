//! Student entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A student enrolled at a school.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "student")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// School the student is enrolled at.
    #[sea_orm(indexed)]
    pub school_id: String,

    /// Full name of the student.
    pub name: String,

    pub enrolled_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::school::Entity",
        from = "Column::SchoolId",
        to = "super::school::Column::Id"
    )]
    School,
    #[sea_orm(has_many = "super::guardian_student::Entity")]
    GuardianStudent,
    #[sea_orm(has_many = "super::consent::Entity")]
    Consent,
    #[sea_orm(has_many = "super::student_document::Entity")]
    StudentDocument,
}

impl Related<super::school::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::School.def()
    }
}

impl Related<super::guardian_student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GuardianStudent.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
