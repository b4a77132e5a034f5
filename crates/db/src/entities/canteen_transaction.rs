//! Canteen wallet transaction entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One wallet sale at a canteen.
///
/// Source rows for the monthly transfer aggregation and item rankings.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "canteen_transaction")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Canteen where the sale happened.
    #[sea_orm(indexed)]
    pub canteen_id: String,

    /// Student whose wallet was charged, when known.
    #[sea_orm(indexed, nullable)]
    pub student_id: Option<String>,

    /// Item sold.
    pub item_name: String,

    /// Units sold.
    pub quantity: i32,

    /// Total charged for the sale.
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub amount: Decimal,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::canteen::Entity",
        from = "Column::CanteenId",
        to = "super::canteen::Column::Id"
    )]
    Canteen,
}

impl Related<super::canteen::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Canteen.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
