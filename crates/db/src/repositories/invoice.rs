//! Invoice repository.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use escola_common::AppResult;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

use crate::entities::{invoice, invoice::InvoiceStatus, Invoice};

/// Repository for invoice operations.
#[derive(Clone)]
pub struct InvoiceRepository {
    db: Arc<DatabaseConnection>,
}

impl InvoiceRepository {
    /// Create a new invoice repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an invoice by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<invoice::Model>> {
        Invoice::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }

    /// Create a new invoice.
    pub async fn create(&self, model: invoice::ActiveModel) -> AppResult<invoice::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }

    /// List invoices for a set of subscriptions, optionally filtered by status.
    pub async fn find_by_subscriptions(
        &self,
        subscription_ids: &[String],
        statuses: &[InvoiceStatus],
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<invoice::Model>> {
        let mut query = Invoice::find()
            .filter(invoice::Column::SubscriptionId.is_in(subscription_ids.iter().cloned()))
            .order_by_desc(invoice::Column::DueDate);

        if !statuses.is_empty() {
            query = query.filter(invoice::Column::Status.is_in(statuses.iter().copied()));
        }

        query
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }

    /// Count invoices for a set of subscriptions, optionally filtered by status.
    pub async fn count_by_subscriptions(
        &self,
        subscription_ids: &[String],
        statuses: &[InvoiceStatus],
    ) -> AppResult<u64> {
        let mut query = Invoice::find()
            .filter(invoice::Column::SubscriptionId.is_in(subscription_ids.iter().cloned()));

        if !statuses.is_empty() {
            query = query.filter(invoice::Column::Status.is_in(statuses.iter().copied()));
        }

        query
            .count(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }

    /// Apply a status transition as a compare-and-swap write.
    ///
    /// Checks the (status, version) pair the caller read and stamps the
    /// timestamp matching the target state in the same statement.
    /// Returns affected rows — zero means a concurrent writer won.
    pub async fn apply_transition(
        &self,
        id: &str,
        read_version: i32,
        from: InvoiceStatus,
        to: InvoiceStatus,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let now_tz: sea_orm::prelude::DateTimeWithTimeZone = now.into();

        let mut update = Invoice::update_many()
            .filter(invoice::Column::Id.eq(id))
            .filter(invoice::Column::Status.eq(from))
            .filter(invoice::Column::Version.eq(read_version))
            .col_expr(invoice::Column::Status, to.into())
            .col_expr(
                invoice::Column::Version,
                Expr::col(invoice::Column::Version).add(1),
            );

        update = match to {
            InvoiceStatus::Paid => update.col_expr(invoice::Column::PaidAt, Some(now_tz).into()),
            InvoiceStatus::Refunded => {
                update.col_expr(invoice::Column::RefundedAt, Some(now_tz).into())
            }
            InvoiceStatus::Canceled => {
                update.col_expr(invoice::Column::CanceledAt, Some(now_tz).into())
            }
            _ => update,
        };

        let result = update
            .exec(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)?;

        Ok(result.rows_affected)
    }

    /// Persist the overdue state for pending invoices past their due date.
    ///
    /// Only touches rows still `Pending`; a payment that landed first
    /// wins. Idempotent by construction.
    pub async fn sweep_mark_overdue(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = Invoice::update_many()
            .filter(invoice::Column::Status.eq(InvoiceStatus::Pending))
            .filter(invoice::Column::DueDate.lt(now))
            .col_expr(invoice::Column::Status, InvoiceStatus::Overdue.into())
            .col_expr(
                invoice::Column::Version,
                Expr::col(invoice::Column::Version).add(1),
            )
            .exec(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_invoice(id: &str, status: InvoiceStatus) -> invoice::Model {
        invoice::Model {
            id: id.to_string(),
            subscription_id: "sub1".to_string(),
            reference_month: 7,
            reference_year: 2025,
            amount: dec!(1250.00),
            due_date: Utc::now().into(),
            status,
            paid_at: None,
            refunded_at: None,
            canceled_at: None,
            created_at: Utc::now().into(),
            version: 0,
        }
    }

    #[tokio::test]
    async fn test_find_by_id_returns_invoice() {
        let inv = create_test_invoice("inv1", InvoiceStatus::Pending);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[inv.clone()]])
                .into_connection(),
        );

        let repo = InvoiceRepository::new(db);
        let found = repo.find_by_id("inv1").await.unwrap().unwrap();

        assert_eq!(found.id, "inv1");
        assert_eq!(found.status, InvoiceStatus::Pending);
    }

    #[tokio::test]
    async fn test_apply_transition_stale_version_affects_nothing() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = InvoiceRepository::new(db);
        let affected = repo
            .apply_transition(
                "inv1",
                5,
                InvoiceStatus::Pending,
                InvoiceStatus::Paid,
                Utc::now(),
            )
            .await
            .unwrap();

        assert_eq!(affected, 0);
    }

    #[tokio::test]
    async fn test_sweep_mark_overdue_reports_affected_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 12,
                }])
                .into_connection(),
        );

        let repo = InvoiceRepository::new(db);
        let affected = repo.sweep_mark_overdue(Utc::now()).await.unwrap();

        assert_eq!(affected, 12);
    }
}
