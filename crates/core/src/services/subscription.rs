//! Subscription service: billing lifecycle for schools and chains.

use std::sync::Arc;

use chrono::{Months, Utc};
use escola_common::{AppError, AppResult, BillingPolicy, PageRequest, Paginated};
use escola_db::entities::{subscription, subscription::BillingCycle, subscription::SubscriptionStatus};
use escola_db::repositories::{PlanRepository, SubscriptionRepository};
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, Set};
use validator::Validate;

use crate::aggregate::StatusRollup;
use crate::guard::{self, SubscriptionAction};
use crate::status::{self, EntityKind, StatusVocabulary};
use crate::tenancy::TenantScope;

/// Input for creating a subscription at onboarding.
#[derive(Debug, Clone, Validate)]
pub struct CreateSubscriptionInput {
    /// Owning school; mutually exclusive with `school_chain_id`.
    pub school_id: Option<String>,
    /// Owning chain; mutually exclusive with `school_id`.
    pub school_chain_id: Option<String>,
    /// Plan to bill against.
    #[validate(length(min = 1))]
    pub plan_id: String,
    /// Invoicing cadence.
    pub billing_cycle: BillingCycle,
    /// Students counted for billing.
    #[validate(range(min = 1))]
    pub active_students: i32,
}

/// Subscription service for the billing lifecycle.
#[derive(Clone)]
pub struct SubscriptionService {
    subscription_repo: SubscriptionRepository,
    plan_repo: PlanRepository,
    policy: BillingPolicy,
}

impl SubscriptionService {
    /// Create a new subscription service.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, policy: BillingPolicy) -> Self {
        Self {
            subscription_repo: SubscriptionRepository::new(db.clone()),
            plan_repo: PlanRepository::new(db),
            policy,
        }
    }

    /// Create a subscription in trial, owned by a school or a chain.
    pub async fn create(&self, input: CreateSubscriptionInput) -> AppResult<subscription::Model> {
        input.validate()?;

        match (&input.school_id, &input.school_chain_id) {
            (Some(_), None) | (None, Some(_)) => {}
            _ => {
                return Err(AppError::Validation(
                    "Subscription must be owned by exactly one of school or chain".to_string(),
                ));
            }
        }

        let plan = self
            .plan_repo
            .find_by_id(&input.plan_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Plan {} not found", input.plan_id)))?;

        let now = Utc::now();
        let trial_end = now
            .checked_add_days(chrono::Days::new(u64::try_from(plan.trial_days.max(0)).unwrap_or(0)))
            .ok_or_else(|| AppError::Internal("Trial end out of range".to_string()))?;
        let monthly_amount = plan.price_per_student * Decimal::from(input.active_students);

        let model = subscription::ActiveModel {
            id: Set(crate::generate_id()),
            school_id: Set(input.school_id),
            school_chain_id: Set(input.school_chain_id),
            plan_id: Set(input.plan_id),
            billing_cycle: Set(input.billing_cycle),
            status: Set(SubscriptionStatus::Trial),
            monthly_amount: Set(monthly_amount),
            active_students: Set(input.active_students),
            current_period_end: Set(trial_end.into()),
            paused_at: Set(None),
            canceled_at: Set(None),
            created_at: Set(now.into()),
            version: Set(0),
        };

        self.subscription_repo.create(model).await
    }

    /// Record a received payment: the subscription becomes active and the
    /// paid period advances by one billing cycle.
    pub async fn activate(&self, scope: &TenantScope, id: &str) -> AppResult<subscription::Model> {
        let record = self.load_scoped(scope, id).await?;

        if guard::subscription_is_replay(record.status, SubscriptionAction::Activate) {
            return Ok(record);
        }

        guard::subscription_transition(
            record.status,
            SubscriptionAction::Activate,
            self.policy.allow_reactivate_canceled,
        )
        .into_result()?;

        let now = Utc::now();
        let period_end = now
            .checked_add_months(Months::new(record.billing_cycle.months()))
            .ok_or_else(|| AppError::Internal("Period end out of range".to_string()))?;

        self.transition(&record, SubscriptionStatus::Active, Some(period_end), "activate")
            .await
    }

    /// Pause billing at the owner's request.
    pub async fn pause(&self, scope: &TenantScope, id: &str) -> AppResult<subscription::Model> {
        self.user_transition(scope, id, SubscriptionAction::Pause).await
    }

    /// Cancel the subscription at the owner's request.
    pub async fn cancel(&self, scope: &TenantScope, id: &str) -> AppResult<subscription::Model> {
        self.user_transition(scope, id, SubscriptionAction::Cancel).await
    }

    /// Reactivate a paused — or, policy permitting, canceled —
    /// subscription.
    pub async fn reactivate(
        &self,
        scope: &TenantScope,
        id: &str,
    ) -> AppResult<subscription::Model> {
        self.user_transition(scope, id, SubscriptionAction::Reactivate)
            .await
    }

    async fn user_transition(
        &self,
        scope: &TenantScope,
        id: &str,
        action: SubscriptionAction,
    ) -> AppResult<subscription::Model> {
        let record = self.load_scoped(scope, id).await?;

        if guard::subscription_is_replay(record.status, action) {
            return Ok(record);
        }

        guard::subscription_transition(
            record.status,
            action,
            self.policy.allow_reactivate_canceled,
        )
        .into_result()?;

        self.transition(&record, action.target(), None, action.name())
            .await
    }

    async fn transition(
        &self,
        record: &subscription::Model,
        to: SubscriptionStatus,
        new_period_end: Option<chrono::DateTime<Utc>>,
        action: &str,
    ) -> AppResult<subscription::Model> {
        let affected = self
            .subscription_repo
            .apply_transition(
                &record.id,
                record.version,
                record.status,
                to,
                new_period_end,
                Utc::now(),
            )
            .await?;

        if affected == 0 {
            return Err(AppError::Conflict(
                "Subscription was modified concurrently".to_string(),
            ));
        }

        tracing::info!(subscription_id = %record.id, action, "Subscription transition applied");

        self.subscription_repo
            .find_by_id(&record.id)
            .await?
            .ok_or_else(|| AppError::Internal("Subscription vanished after update".to_string()))
    }

    /// List subscriptions inside a tenant scope, filtered by raw status
    /// values.
    pub async fn list_for_scope(
        &self,
        scope: &TenantScope,
        status_filters: &[String],
        page: PageRequest,
    ) -> AppResult<Paginated<subscription::Model>> {
        let statuses: Vec<SubscriptionStatus> =
            status::parse_filters(EntityKind::Subscription, status_filters)?;

        let total = self
            .subscription_repo
            .count_scoped(scope.school_id(), scope.chain_id(), &statuses)
            .await?;
        let data = self
            .subscription_repo
            .find_scoped(
                scope.school_id(),
                scope.chain_id(),
                &statuses,
                page.limit(),
                page.offset(),
            )
            .await?;

        Ok(Paginated::new(data, page, total))
    }

    /// Counts per status for the scope's subscriptions (overview card).
    pub async fn status_rollup(&self, scope: &TenantScope) -> AppResult<StatusRollup> {
        let mut counts = Vec::with_capacity(6);
        for s in [
            SubscriptionStatus::Trial,
            SubscriptionStatus::Active,
            SubscriptionStatus::PastDue,
            SubscriptionStatus::Blocked,
            SubscriptionStatus::Canceled,
            SubscriptionStatus::Paused,
        ] {
            let count = self
                .subscription_repo
                .count_scoped(scope.school_id(), scope.chain_id(), &[s])
                .await?;
            counts.push((s.canonical(), count));
        }

        Ok(StatusRollup::from_counts(counts))
    }

    async fn load_scoped(
        &self,
        scope: &TenantScope,
        id: &str,
    ) -> AppResult<subscription::Model> {
        let record = self
            .subscription_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Subscription {id} not found")))?;

        scope.ensure_owner(
            record.school_id.as_deref(),
            record.school_chain_id.as_deref(),
        )?;

        Ok(record)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn test_subscription(id: &str, status: SubscriptionStatus) -> subscription::Model {
        subscription::Model {
            id: id.to_string(),
            school_id: Some("school1".to_string()),
            school_chain_id: None,
            plan_id: "plan1".to_string(),
            billing_cycle: BillingCycle::Monthly,
            status,
            monthly_amount: dec!(1250.00),
            active_students: 250,
            current_period_end: Utc::now().into(),
            paused_at: None,
            canceled_at: None,
            created_at: Utc::now().into(),
            version: 0,
        }
    }

    fn school_scope() -> TenantScope {
        TenantScope::School("school1".to_string())
    }

    fn permissive_policy() -> BillingPolicy {
        BillingPolicy::default()
    }

    fn strict_policy() -> BillingPolicy {
        BillingPolicy {
            allow_reactivate_canceled: false,
            ..BillingPolicy::default()
        }
    }

    #[tokio::test]
    async fn test_pause_active_subscription() {
        let active = test_subscription("sub1", SubscriptionStatus::Active);
        let mut paused = active.clone();
        paused.status = SubscriptionStatus::Paused;
        paused.paused_at = Some(Utc::now().into());
        paused.version = 1;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[active]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[paused]])
                .into_connection(),
        );

        let service = SubscriptionService::new(db, permissive_policy());
        let result = service.pause(&school_scope(), "sub1").await.unwrap();

        assert_eq!(result.status, SubscriptionStatus::Paused);
        assert!(result.paused_at.is_some());
    }

    #[tokio::test]
    async fn test_reactivate_canceled_respects_policy() {
        let canceled = test_subscription("sub1", SubscriptionStatus::Canceled);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[canceled]])
                .into_connection(),
        );

        let service = SubscriptionService::new(db, strict_policy());
        let err = service.reactivate(&school_scope(), "sub1").await.unwrap_err();

        assert!(matches!(err, AppError::InvalidSourceState { .. }));
    }

    #[tokio::test]
    async fn test_reactivate_canceled_allowed_by_default_policy() {
        let canceled = test_subscription("sub1", SubscriptionStatus::Canceled);
        let mut active = canceled.clone();
        active.status = SubscriptionStatus::Active;
        active.version = 1;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[canceled]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[active]])
                .into_connection(),
        );

        let service = SubscriptionService::new(db, permissive_policy());
        let result = service.reactivate(&school_scope(), "sub1").await.unwrap();

        assert_eq!(result.status, SubscriptionStatus::Active);
    }

    #[tokio::test]
    async fn test_pause_from_trial_is_invalid_source_state() {
        let trial = test_subscription("sub1", SubscriptionStatus::Trial);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[trial]])
                .into_connection(),
        );

        let service = SubscriptionService::new(db, permissive_policy());
        let err = service.pause(&school_scope(), "sub1").await.unwrap_err();

        assert!(matches!(err, AppError::InvalidSourceState { .. }));
    }

    #[tokio::test]
    async fn test_command_outside_scope_is_tenant_mismatch() {
        let active = test_subscription("sub1", SubscriptionStatus::Active);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[active]])
                .into_connection(),
        );

        let service = SubscriptionService::new(db, permissive_policy());
        let chain_scope = TenantScope::Chain("chain1".to_string());
        let err = service.pause(&chain_scope, "sub1").await.unwrap_err();

        assert!(matches!(err, AppError::TenantMismatch));
    }

    #[tokio::test]
    async fn test_concurrent_transition_surfaces_conflict() {
        let active = test_subscription("sub1", SubscriptionStatus::Active);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[active]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let service = SubscriptionService::new(db, permissive_policy());
        let err = service.cancel(&school_scope(), "sub1").await.unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_repausing_paused_subscription_is_noop_success() {
        let paused = test_subscription("sub1", SubscriptionStatus::Paused);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[paused.clone()]])
                .into_connection(),
        );

        let service = SubscriptionService::new(db, permissive_policy());
        let result = service.pause(&school_scope(), "sub1").await.unwrap();

        assert_eq!(result.version, paused.version);
    }
}
