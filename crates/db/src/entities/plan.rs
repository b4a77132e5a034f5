//! Subscription plan entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A billing plan a school or chain subscribes to.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "plan")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Display name of the plan.
    pub name: String,

    /// Price per active student per month.
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub price_per_student: Decimal,

    /// Trial period granted at onboarding, in days.
    pub trial_days: i32,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::subscription::Entity")]
    Subscription,
}

impl Related<super::subscription::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subscription.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
