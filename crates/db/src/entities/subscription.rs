//! Subscription entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Billing cycle of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[derive(Default)]
pub enum BillingCycle {
    #[sea_orm(string_value = "monthly")]
    #[default]
    Monthly,
    #[sea_orm(string_value = "quarterly")]
    Quarterly,
    #[sea_orm(string_value = "semi_annual")]
    SemiAnnual,
    #[sea_orm(string_value = "annual")]
    Annual,
}

impl BillingCycle {
    /// Number of months covered by one billing period.
    #[must_use]
    pub const fn months(self) -> u32 {
        match self {
            Self::Monthly => 1,
            Self::Quarterly => 3,
            Self::SemiAnnual => 6,
            Self::Annual => 12,
        }
    }
}

/// Status of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[derive(Default)]
pub enum SubscriptionStatus {
    /// Onboarding trial, no payment received yet.
    #[sea_orm(string_value = "trial")]
    #[default]
    Trial,
    /// Paid up and in good standing.
    #[sea_orm(string_value = "active")]
    Active,
    /// Missed a payment; still inside the grace period.
    #[sea_orm(string_value = "past_due")]
    PastDue,
    /// Grace period elapsed with unpaid obligations. System-imposed.
    #[sea_orm(string_value = "blocked")]
    Blocked,
    /// Canceled by the owner.
    #[sea_orm(string_value = "canceled")]
    Canceled,
    /// Paused by the owner.
    #[sea_orm(string_value = "paused")]
    Paused,
}

/// A school or chain's billing relationship to a plan.
///
/// Owned by exactly one of `school_id` / `school_chain_id`. Rows are
/// never hard-deleted; cancellation is a status transition.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscription")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Owning school, when subscribed per-school.
    #[sea_orm(indexed, nullable)]
    pub school_id: Option<String>,

    /// Owning chain, when subscribed chain-wide.
    #[sea_orm(indexed, nullable)]
    pub school_chain_id: Option<String>,

    /// Plan being billed.
    #[sea_orm(indexed)]
    pub plan_id: String,

    /// How often the subscription is invoiced.
    pub billing_cycle: BillingCycle,

    /// Current status.
    pub status: SubscriptionStatus,

    /// Charge per month at the current student count.
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub monthly_amount: Decimal,

    /// Students counted for billing.
    pub active_students: i32,

    /// End of the currently paid/trial period.
    pub current_period_end: DateTimeWithTimeZone,

    /// When the subscription was paused.
    #[sea_orm(nullable)]
    pub paused_at: Option<DateTimeWithTimeZone>,

    /// When the subscription was canceled.
    #[sea_orm(nullable)]
    pub canceled_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    /// Optimistic concurrency version, bumped on every write.
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::school::Entity",
        from = "Column::SchoolId",
        to = "super::school::Column::Id"
    )]
    School,
    #[sea_orm(
        belongs_to = "super::school_chain::Entity",
        from = "Column::SchoolChainId",
        to = "super::school_chain::Column::Id"
    )]
    SchoolChain,
    #[sea_orm(
        belongs_to = "super::plan::Entity",
        from = "Column::PlanId",
        to = "super::plan::Column::Id"
    )]
    Plan,
    #[sea_orm(has_many = "super::invoice::Entity")]
    Invoice,
}

impl Related<super::plan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Plan.def()
    }
}

impl Related<super::invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoice.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
