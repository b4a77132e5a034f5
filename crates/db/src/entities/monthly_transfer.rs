//! Monthly canteen transfer entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Settlement status of a monthly transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[derive(Default)]
pub enum TransferStatus {
    /// Aggregated and waiting for payout.
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    /// Payout in flight.
    #[sea_orm(string_value = "processing")]
    Processing,
    /// Payout settled.
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Payout failed.
    #[sea_orm(string_value = "failed")]
    Failed,
}

/// Aggregated payout for one canteen and billing month.
///
/// One row per (canteen, month, year), created by the aggregation sweep.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "monthly_transfer")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Canteen being paid out.
    #[sea_orm(indexed)]
    pub canteen_id: String,

    /// Settlement month (1-12).
    pub month: i32,

    /// Settlement year.
    pub year: i32,

    /// Sum of wallet sales in the period.
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total_amount: Decimal,

    /// Number of sales aggregated.
    pub transaction_count: i32,

    /// Current settlement status.
    pub status: TransferStatus,

    /// When the payout finished (completed or failed).
    #[sea_orm(nullable)]
    pub processed_at: Option<DateTimeWithTimeZone>,

    /// Failure detail when status is `Failed`.
    #[sea_orm(column_type = "Text", nullable)]
    pub error_message: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    /// Optimistic concurrency version, bumped on every write.
    pub version: i32,
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
