//! Canteen entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A school canteen whose wallet sales settle into monthly transfers.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "canteen")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// School the canteen operates at.
    #[sea_orm(indexed)]
    pub school_id: String,

    /// Display name of the canteen.
    pub name: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::school::Entity",
        from = "Column::SchoolId",
        to = "super::school::Column::Id"
    )]
    School,
    #[sea_orm(has_many = "super::canteen_transaction::Entity")]
    CanteenTransaction,
    #[sea_orm(has_many = "super::monthly_transfer::Entity")]
    MonthlyTransfer,
}

impl Related<super::school::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::School.def()
    }
}

impl Related<super::canteen_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CanteenTransaction.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
