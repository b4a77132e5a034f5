//! Sweep executor: wires the scheduled jobs to the engine.
//!
//! Every sweep is an at-least-once, idempotent compare-and-swap bulk
//! update; running one concurrently with user commands (or with itself)
//! only ever moves rows that are still in the swept source state.

use std::sync::Arc;

use chrono::{Datelike, Duration, Utc};
use escola_common::BillingPolicy;
use escola_core::MonthlyTransferService;
use escola_db::repositories::{ConsentRepository, InvoiceRepository, SubscriptionRepository};
use sea_orm::DatabaseConnection;

use crate::scheduler::JobExecutor;

/// Executor for the periodic sweeps.
pub struct SweepExecutor {
    consent_repo: ConsentRepository,
    invoice_repo: InvoiceRepository,
    subscription_repo: SubscriptionRepository,
    transfer_service: MonthlyTransferService,
    policy: BillingPolicy,
}

impl SweepExecutor {
    /// Create a new sweep executor.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, policy: BillingPolicy) -> Self {
        Self {
            consent_repo: ConsentRepository::new(db.clone()),
            invoice_repo: InvoiceRepository::new(db.clone()),
            subscription_repo: SubscriptionRepository::new(db.clone()),
            transfer_service: MonthlyTransferService::new(db),
            policy,
        }
    }
}

#[async_trait::async_trait]
impl JobExecutor for SweepExecutor {
    async fn sweep_expired_consents(
        &self,
    ) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
        let count = self.consent_repo.sweep_expire(Utc::now()).await?;
        Ok(count)
    }

    async fn sweep_overdue_invoices(
        &self,
    ) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
        let count = self.invoice_repo.sweep_mark_overdue(Utc::now()).await?;
        Ok(count)
    }

    async fn sweep_delinquent_subscriptions(
        &self,
    ) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
        let now = Utc::now();

        let past_due = self.subscription_repo.sweep_mark_past_due(now).await?;

        let grace_cutoff = now - Duration::days(self.policy.grace_period_days);
        let blocked = self
            .subscription_repo
            .sweep_block_delinquent(grace_cutoff)
            .await?;

        Ok(past_due + blocked)
    }

    async fn aggregate_monthly_transfers(
        &self,
    ) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
        let now = Utc::now();
        let (month, year) = previous_month(i32::try_from(now.month()).unwrap_or(1), now.year());

        let created = self.transfer_service.aggregate_month(month, year).await?;
        Ok(created)
    }
}

/// The settlement period immediately before the given month.
const fn previous_month(month: i32, year: i32) -> (i32, i32) {
    if month == 1 {
        (12, year - 1)
    } else {
        (month - 1, year)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[test]
    fn test_previous_month_mid_year() {
        assert_eq!(previous_month(7, 2025), (6, 2025));
    }

    #[test]
    fn test_previous_month_january_rolls_year() {
        assert_eq!(previous_month(1, 2025), (12, 2024));
    }

    #[tokio::test]
    async fn test_consent_sweep_reports_moved_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 4,
                }])
                .into_connection(),
        );

        let executor = SweepExecutor::new(db, BillingPolicy::default());
        let count = executor.sweep_expired_consents().await.unwrap();

        assert_eq!(count, 4);
    }

    #[tokio::test]
    async fn test_consent_sweep_is_idempotent_when_nothing_pending() {
        // Re-running over already-expired rows affects nothing.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let executor = SweepExecutor::new(db, BillingPolicy::default());
        let count = executor.sweep_expired_consents().await.unwrap();

        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_delinquency_sweep_sums_both_passes() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 2,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ])
                .into_connection(),
        );

        let executor = SweepExecutor::new(db, BillingPolicy::default());
        let count = executor.sweep_delinquent_subscriptions().await.unwrap();

        assert_eq!(count, 3);
    }
}
