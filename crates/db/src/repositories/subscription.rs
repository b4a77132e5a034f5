//! Subscription repository.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use escola_common::AppResult;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

use crate::entities::{subscription, subscription::SubscriptionStatus, Subscription};

/// Repository for subscription operations.
#[derive(Clone)]
pub struct SubscriptionRepository {
    db: Arc<DatabaseConnection>,
}

impl SubscriptionRepository {
    /// Create a new subscription repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a subscription by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<subscription::Model>> {
        Subscription::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }

    /// Create a new subscription.
    pub async fn create(&self, model: subscription::ActiveModel) -> AppResult<subscription::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }

    /// List subscriptions for one owner scope, optionally filtered by status.
    ///
    /// Exactly one of `school_id` / `school_chain_id` is expected; the
    /// service layer guarantees this via `TenantScope`.
    pub async fn find_scoped(
        &self,
        school_id: Option<&str>,
        school_chain_id: Option<&str>,
        statuses: &[SubscriptionStatus],
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<subscription::Model>> {
        let mut query = Subscription::find().order_by_desc(subscription::Column::CreatedAt);

        if let Some(id) = school_id {
            query = query.filter(subscription::Column::SchoolId.eq(id));
        }
        if let Some(id) = school_chain_id {
            query = query.filter(subscription::Column::SchoolChainId.eq(id));
        }
        if !statuses.is_empty() {
            query = query.filter(subscription::Column::Status.is_in(statuses.iter().copied()));
        }

        query
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }

    /// Count subscriptions for one owner scope, optionally filtered by status.
    pub async fn count_scoped(
        &self,
        school_id: Option<&str>,
        school_chain_id: Option<&str>,
        statuses: &[SubscriptionStatus],
    ) -> AppResult<u64> {
        let mut query = Subscription::find();

        if let Some(id) = school_id {
            query = query.filter(subscription::Column::SchoolId.eq(id));
        }
        if let Some(id) = school_chain_id {
            query = query.filter(subscription::Column::SchoolChainId.eq(id));
        }
        if !statuses.is_empty() {
            query = query.filter(subscription::Column::Status.is_in(statuses.iter().copied()));
        }

        query
            .count(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }

    /// IDs of all subscriptions owned by one scope.
    pub async fn find_ids_scoped(
        &self,
        school_id: Option<&str>,
        school_chain_id: Option<&str>,
    ) -> AppResult<Vec<String>> {
        let mut query = Subscription::find()
            .select_only()
            .column(subscription::Column::Id);

        if let Some(id) = school_id {
            query = query.filter(subscription::Column::SchoolId.eq(id));
        }
        if let Some(id) = school_chain_id {
            query = query.filter(subscription::Column::SchoolChainId.eq(id));
        }

        query
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }

    /// Apply a status transition as a compare-and-swap write.
    ///
    /// The UPDATE re-checks the (status, version) pair the caller read.
    /// Entering `Paused`/`Canceled` stamps the matching timestamp;
    /// returning to `Active` clears both. An optional new period end
    /// lands in the same statement (payment received). Returns affected
    /// rows — zero means a concurrent writer won.
    pub async fn apply_transition(
        &self,
        id: &str,
        read_version: i32,
        from: SubscriptionStatus,
        to: SubscriptionStatus,
        new_period_end: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let now_tz: sea_orm::prelude::DateTimeWithTimeZone = now.into();

        let mut update = Subscription::update_many()
            .filter(subscription::Column::Id.eq(id))
            .filter(subscription::Column::Status.eq(from))
            .filter(subscription::Column::Version.eq(read_version))
            .col_expr(subscription::Column::Status, to.into())
            .col_expr(
                subscription::Column::Version,
                Expr::col(subscription::Column::Version).add(1),
            );

        update = match to {
            SubscriptionStatus::Paused => {
                update.col_expr(subscription::Column::PausedAt, Some(now_tz).into())
            }
            SubscriptionStatus::Canceled => {
                update.col_expr(subscription::Column::CanceledAt, Some(now_tz).into())
            }
            SubscriptionStatus::Active => update
                .col_expr(
                    subscription::Column::PausedAt,
                    Option::<sea_orm::prelude::DateTimeWithTimeZone>::None.into(),
                )
                .col_expr(
                    subscription::Column::CanceledAt,
                    Option::<sea_orm::prelude::DateTimeWithTimeZone>::None.into(),
                ),
            _ => update,
        };

        if let Some(period_end) = new_period_end {
            let period_end_tz: sea_orm::prelude::DateTimeWithTimeZone = period_end.into();
            update = update.col_expr(
                subscription::Column::CurrentPeriodEnd,
                period_end_tz.into(),
            );
        }

        let result = update
            .exec(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)?;

        Ok(result.rows_affected)
    }

    /// Move active subscriptions whose paid period has ended to past-due.
    pub async fn sweep_mark_past_due(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = Subscription::update_many()
            .filter(subscription::Column::Status.eq(SubscriptionStatus::Active))
            .filter(subscription::Column::CurrentPeriodEnd.lt(now))
            .col_expr(
                subscription::Column::Status,
                SubscriptionStatus::PastDue.into(),
            )
            .col_expr(
                subscription::Column::Version,
                Expr::col(subscription::Column::Version).add(1),
            )
            .exec(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)?;

        Ok(result.rows_affected)
    }

    /// Block past-due subscriptions whose grace period has elapsed.
    ///
    /// `grace_cutoff` is `now - grace_period`: any past-due subscription
    /// whose period ended before the cutoff has exhausted its grace.
    pub async fn sweep_block_delinquent(&self, grace_cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = Subscription::update_many()
            .filter(subscription::Column::Status.eq(SubscriptionStatus::PastDue))
            .filter(subscription::Column::CurrentPeriodEnd.lt(grace_cutoff))
            .col_expr(
                subscription::Column::Status,
                SubscriptionStatus::Blocked.into(),
            )
            .col_expr(
                subscription::Column::Version,
                Expr::col(subscription::Column::Version).add(1),
            )
            .exec(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)?;

        Ok(result.rows_affected)
    }
}
