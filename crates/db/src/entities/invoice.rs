//! Subscription invoice entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Status of an invoice.
///
/// `Overdue` is time-derived: a pending invoice past its due date reads
/// as overdue before any write lands (see the expiry evaluator), and the
/// sweep eventually persists it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[derive(Default)]
pub enum InvoiceStatus {
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "overdue")]
    Overdue,
    #[sea_orm(string_value = "canceled")]
    Canceled,
    #[sea_orm(string_value = "refunded")]
    Refunded,
}

/// One billing period's charge for a subscription.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoice")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Subscription being charged.
    #[sea_orm(indexed)]
    pub subscription_id: String,

    /// Billing period month (1-12).
    pub reference_month: i32,

    /// Billing period year.
    pub reference_year: i32,

    /// Amount charged for the period.
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub amount: Decimal,

    /// Payment deadline.
    pub due_date: DateTimeWithTimeZone,

    /// Current status.
    pub status: InvoiceStatus,

    /// When payment was confirmed.
    #[sea_orm(nullable)]
    pub paid_at: Option<DateTimeWithTimeZone>,

    /// When the payment was refunded.
    #[sea_orm(nullable)]
    pub refunded_at: Option<DateTimeWithTimeZone>,

    /// When the invoice was canceled.
    #[sea_orm(nullable)]
    pub canceled_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    /// Optimistic concurrency version, bumped on every write.
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::subscription::Entity",
        from = "Column::SubscriptionId",
        to = "super::subscription::Column::Id"
    )]
    Subscription,
}

impl Related<super::subscription::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subscription.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
