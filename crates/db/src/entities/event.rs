//! School event entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A school event (excursion, fair, ...) that may require parental consent.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// School hosting the event.
    #[sea_orm(indexed)]
    pub school_id: String,

    /// Event title.
    pub title: String,

    /// When the event takes place.
    pub starts_at: DateTimeWithTimeZone,

    /// Whether publishing this event creates consent requests.
    pub requires_consent: bool,

    /// Deadline for guardians to answer; consents expire past this point.
    #[sea_orm(nullable)]
    pub consent_deadline: Option<DateTimeWithTimeZone>,

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
    #[sea_orm(has_many = "super::consent::Entity")]
    Consent,
}

impl Related<super::school::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::School.def()
    }
}

impl Related<super::consent::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Consent.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
