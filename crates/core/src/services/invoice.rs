//! Invoice service: per-period charges for subscriptions.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use escola_common::{AppError, AppResult, PageRequest, Paginated};
use escola_db::entities::{invoice, invoice::InvoiceStatus};
use escola_db::repositories::{InvoiceRepository, SubscriptionRepository};
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, Set};
use validator::Validate;

use crate::aggregate::StatusRollup;
use crate::expiry;
use crate::guard::{self, InvoiceAction};
use crate::status::{self, EntityKind, StatusVocabulary};
use crate::tenancy::TenantScope;

/// Input for issuing one billing period's invoice.
#[derive(Debug, Clone, Validate)]
pub struct CreateInvoiceInput {
    /// Subscription being charged.
    #[validate(length(min = 1))]
    pub subscription_id: String,
    /// Billing period month.
    #[validate(range(min = 1, max = 12))]
    pub reference_month: i32,
    /// Billing period year.
    #[validate(range(min = 2000))]
    pub reference_year: i32,
    /// Amount charged.
    pub amount: Decimal,
    /// Payment deadline.
    pub due_date: DateTime<Utc>,
}

/// Invoice service for billing charges.
#[derive(Clone)]
pub struct InvoiceService {
    invoice_repo: InvoiceRepository,
    subscription_repo: SubscriptionRepository,
}

impl InvoiceService {
    /// Create a new invoice service.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            invoice_repo: InvoiceRepository::new(db.clone()),
            subscription_repo: SubscriptionRepository::new(db),
        }
    }

    /// Issue an invoice for one billing period.
    ///
    /// The (subscription, month, year) pair is unique; issuing the same
    /// period twice fails at the storage layer.
    pub async fn issue(&self, input: CreateInvoiceInput) -> AppResult<invoice::Model> {
        input.validate()?;

        if input.amount <= Decimal::ZERO {
            return Err(AppError::Validation(
                "Invoice amount must be positive".to_string(),
            ));
        }

        self.subscription_repo
            .find_by_id(&input.subscription_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Subscription {} not found",
                    input.subscription_id
                ))
            })?;

        let model = invoice::ActiveModel {
            id: Set(crate::generate_id()),
            subscription_id: Set(input.subscription_id),
            reference_month: Set(input.reference_month),
            reference_year: Set(input.reference_year),
            amount: Set(input.amount),
            due_date: Set(input.due_date.into()),
            status: Set(InvoiceStatus::Pending),
            paid_at: Set(None),
            refunded_at: Set(None),
            canceled_at: Set(None),
            created_at: Set(Utc::now().into()),
            version: Set(0),
        };

        self.invoice_repo.create(model).await
    }

    /// Record a confirmed payment.
    pub async fn mark_paid(&self, scope: &TenantScope, id: &str) -> AppResult<invoice::Model> {
        self.command(scope, id, InvoiceAction::MarkPaid).await
    }

    /// Void the charge (admin).
    pub async fn cancel(&self, scope: &TenantScope, id: &str) -> AppResult<invoice::Model> {
        self.command(scope, id, InvoiceAction::Cancel).await
    }

    /// Refund a paid invoice (admin).
    pub async fn refund(&self, scope: &TenantScope, id: &str) -> AppResult<invoice::Model> {
        self.command(scope, id, InvoiceAction::Refund).await
    }

    async fn command(
        &self,
        scope: &TenantScope,
        id: &str,
        action: InvoiceAction,
    ) -> AppResult<invoice::Model> {
        let record = self
            .invoice_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Invoice {id} not found")))?;

        self.ensure_in_scope(scope, &record).await?;

        if guard::invoice_is_replay(record.status, action) {
            return Ok(record);
        }

        guard::invoice_transition(record.status, action).into_result()?;

        let affected = self
            .invoice_repo
            .apply_transition(
                &record.id,
                record.version,
                record.status,
                action.target(),
                Utc::now(),
            )
            .await?;

        if affected == 0 {
            return Err(AppError::Conflict(
                "Invoice was modified concurrently".to_string(),
            ));
        }

        tracing::info!(invoice_id = %record.id, action = action.name(), "Invoice transition applied");

        self.invoice_repo
            .find_by_id(&record.id)
            .await?
            .ok_or_else(|| AppError::Internal("Invoice vanished after update".to_string()))
    }

    /// List invoices inside a tenant scope, filtered by raw status values.
    pub async fn list_for_scope(
        &self,
        scope: &TenantScope,
        status_filters: &[String],
        page: PageRequest,
    ) -> AppResult<Paginated<invoice::Model>> {
        let statuses: Vec<InvoiceStatus> =
            status::parse_filters(EntityKind::Invoice, status_filters)?;

        let subscription_ids = self
            .subscription_repo
            .find_ids_scoped(scope.school_id(), scope.chain_id())
            .await?;

        let total = self
            .invoice_repo
            .count_by_subscriptions(&subscription_ids, &statuses)
            .await?;
        let data = self
            .invoice_repo
            .find_by_subscriptions(&subscription_ids, &statuses, page.limit(), page.offset())
            .await?;

        Ok(Paginated::new(data, page, total))
    }

    /// Counts per status for the scope's invoices (overview card).
    pub async fn status_rollup(&self, scope: &TenantScope) -> AppResult<StatusRollup> {
        let subscription_ids = self
            .subscription_repo
            .find_ids_scoped(scope.school_id(), scope.chain_id())
            .await?;

        let mut counts = Vec::with_capacity(5);
        for s in [
            InvoiceStatus::Pending,
            InvoiceStatus::Paid,
            InvoiceStatus::Overdue,
            InvoiceStatus::Canceled,
            InvoiceStatus::Refunded,
        ] {
            let count = self
                .invoice_repo
                .count_by_subscriptions(&subscription_ids, &[s])
                .await?;
            counts.push((s.canonical(), count));
        }

        Ok(StatusRollup::from_counts(counts))
    }

    /// The display status of an invoice at `now`, due date included.
    #[must_use]
    pub fn effective_status(record: &invoice::Model, now: DateTime<Utc>) -> InvoiceStatus {
        expiry::effective_invoice_status(record.status, record.due_date.into(), now)
    }

    async fn ensure_in_scope(
        &self,
        scope: &TenantScope,
        record: &invoice::Model,
    ) -> AppResult<()> {
        let subscription = self
            .subscription_repo
            .find_by_id(&record.subscription_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal("Invoice references a missing subscription".to_string())
            })?;

        scope.ensure_owner(
            subscription.school_id.as_deref(),
            subscription.school_chain_id.as_deref(),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use escola_db::entities::subscription::{self, BillingCycle, SubscriptionStatus};
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn test_invoice(id: &str, status: InvoiceStatus) -> invoice::Model {
        invoice::Model {
            id: id.to_string(),
            subscription_id: "sub1".to_string(),
            reference_month: 7,
            reference_year: 2025,
            amount: dec!(1250.00),
            due_date: (Utc::now() - Duration::days(1)).into(),
            status,
            paid_at: None,
            refunded_at: None,
            canceled_at: None,
            created_at: Utc::now().into(),
            version: 0,
        }
    }

    fn test_subscription(id: &str) -> subscription::Model {
        subscription::Model {
            id: id.to_string(),
            school_id: Some("school1".to_string()),
            school_chain_id: None,
            plan_id: "plan1".to_string(),
            billing_cycle: BillingCycle::Monthly,
            status: SubscriptionStatus::Active,
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

    #[tokio::test]
    async fn test_mark_paid_pending_invoice() {
        let pending = test_invoice("inv1", InvoiceStatus::Pending);
        let mut paid = pending.clone();
        paid.status = InvoiceStatus::Paid;
        paid.paid_at = Some(Utc::now().into());
        paid.version = 1;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[pending]])
                .append_query_results([[test_subscription("sub1")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[paid]])
                .into_connection(),
        );

        let service = InvoiceService::new(db);
        let result = service.mark_paid(&school_scope(), "inv1").await.unwrap();

        assert_eq!(result.status, InvoiceStatus::Paid);
        assert!(result.paid_at.is_some());
    }

    #[tokio::test]
    async fn test_refund_pending_invoice_is_invalid_source_state() {
        let pending = test_invoice("inv1", InvoiceStatus::Pending);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[pending]])
                .append_query_results([[test_subscription("sub1")]])
                .into_connection(),
        );

        let service = InvoiceService::new(db);
        let err = service.refund(&school_scope(), "inv1").await.unwrap_err();

        assert!(matches!(err, AppError::InvalidSourceState { .. }));
    }

    #[tokio::test]
    async fn test_effective_status_overdue_until_paid() {
        let pending = test_invoice("inv1", InvoiceStatus::Pending);
        let now = Utc::now();

        // Past due and still pending: reads overdue.
        assert_eq!(
            InvoiceService::effective_status(&pending, now),
            InvoiceStatus::Overdue
        );

        // Once paid, never overdue again, however late "now" is.
        let mut paid = pending;
        paid.status = InvoiceStatus::Paid;
        assert_eq!(
            InvoiceService::effective_status(&paid, now + Duration::days(365)),
            InvoiceStatus::Paid
        );
    }

    #[tokio::test]
    async fn test_concurrent_payment_surfaces_conflict() {
        let pending = test_invoice("inv1", InvoiceStatus::Pending);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[pending]])
                .append_query_results([[test_subscription("sub1")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let service = InvoiceService::new(db);
        let err = service.mark_paid(&school_scope(), "inv1").await.unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_marking_paid_invoice_paid_again_is_noop_success() {
        let mut paid = test_invoice("inv1", InvoiceStatus::Paid);
        paid.paid_at = Some(Utc::now().into());

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[paid.clone()]])
                .append_query_results([[test_subscription("sub1")]])
                .into_connection(),
        );

        let service = InvoiceService::new(db);
        let result = service.mark_paid(&school_scope(), "inv1").await.unwrap();

        assert_eq!(result.version, paid.version);
    }
}
