//! School entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A school tenant.
///
/// A school either belongs to a chain or stands alone.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "school")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Chain this school belongs to, if any.
    #[sea_orm(indexed, nullable)]
    pub school_chain_id: Option<String>,

    /// Display name of the school.
    pub name: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::school_chain::Entity",
        from = "Column::SchoolChainId",
        to = "super::school_chain::Column::Id"
    )]
    SchoolChain,
    #[sea_orm(has_many = "super::student::Entity")]
    Student,
    #[sea_orm(has_many = "super::canteen::Entity")]
    Canteen,
}

impl Related<super::school_chain::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SchoolChain.def()
    }
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
