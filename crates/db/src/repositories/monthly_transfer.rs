//! Monthly transfer repository.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use escola_common::AppResult;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

use crate::entities::{monthly_transfer, monthly_transfer::TransferStatus, MonthlyTransfer};

/// Repository for monthly transfer operations.
#[derive(Clone)]
pub struct MonthlyTransferRepository {
    db: Arc<DatabaseConnection>,
}

impl MonthlyTransferRepository {
    /// Create a new monthly transfer repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a transfer by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<monthly_transfer::Model>> {
        MonthlyTransfer::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }

    /// Find the transfer for one canteen and settlement period.
    pub async fn find_by_period(
        &self,
        canteen_id: &str,
        month: i32,
        year: i32,
    ) -> AppResult<Option<monthly_transfer::Model>> {
        MonthlyTransfer::find()
            .filter(monthly_transfer::Column::CanteenId.eq(canteen_id))
            .filter(monthly_transfer::Column::Month.eq(month))
            .filter(monthly_transfer::Column::Year.eq(year))
            .one(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }

    /// Create a new transfer row.
    pub async fn create(
        &self,
        model: monthly_transfer::ActiveModel,
    ) -> AppResult<monthly_transfer::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }

    /// List transfers for a set of canteens, optionally filtered by status.
    pub async fn find_by_canteens(
        &self,
        canteen_ids: &[String],
        statuses: &[TransferStatus],
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<monthly_transfer::Model>> {
        let mut query = MonthlyTransfer::find()
            .filter(monthly_transfer::Column::CanteenId.is_in(canteen_ids.iter().cloned()))
            .order_by_desc(monthly_transfer::Column::Year)
            .order_by_desc(monthly_transfer::Column::Month);

        if !statuses.is_empty() {
            query = query.filter(monthly_transfer::Column::Status.is_in(statuses.iter().copied()));
        }

        query
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }

    /// Count transfers for a set of canteens, optionally filtered by status.
    pub async fn count_by_canteens(
        &self,
        canteen_ids: &[String],
        statuses: &[TransferStatus],
    ) -> AppResult<u64> {
        let mut query = MonthlyTransfer::find()
            .filter(monthly_transfer::Column::CanteenId.is_in(canteen_ids.iter().cloned()));

        if !statuses.is_empty() {
            query = query.filter(monthly_transfer::Column::Status.is_in(statuses.iter().copied()));
        }

        query
            .count(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }

    /// Apply a settlement transition as a compare-and-swap write.
    ///
    /// Completed/failed transitions stamp `processed_at`; failures carry
    /// the error detail in the same statement. Returns affected rows —
    /// zero means a concurrent writer won.
    pub async fn apply_transition(
        &self,
        id: &str,
        read_version: i32,
        from: TransferStatus,
        to: TransferStatus,
        error_message: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let now_tz: sea_orm::prelude::DateTimeWithTimeZone = now.into();

        let mut update = MonthlyTransfer::update_many()
            .filter(monthly_transfer::Column::Id.eq(id))
            .filter(monthly_transfer::Column::Status.eq(from))
            .filter(monthly_transfer::Column::Version.eq(read_version))
            .col_expr(monthly_transfer::Column::Status, to.into())
            .col_expr(
                monthly_transfer::Column::Version,
                Expr::col(monthly_transfer::Column::Version).add(1),
            );

        if matches!(to, TransferStatus::Completed | TransferStatus::Failed) {
            update = update.col_expr(monthly_transfer::Column::ProcessedAt, Some(now_tz).into());
        }

        if let Some(message) = error_message {
            update = update.col_expr(
                monthly_transfer::Column::ErrorMessage,
                Some(message.to_string()).into(),
            );
        }

        let result = update
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

    fn create_test_transfer(id: &str, status: TransferStatus) -> monthly_transfer::Model {
        monthly_transfer::Model {
            id: id.to_string(),
            canteen_id: "canteen1".to_string(),
            month: 7,
            year: 2025,
            total_amount: dec!(4820.50),
            transaction_count: 361,
            status,
            processed_at: None,
            error_message: None,
            created_at: Utc::now().into(),
            version: 0,
        }
    }

    #[tokio::test]
    async fn test_find_by_period_returns_transfer() {
        let transfer = create_test_transfer("mt1", TransferStatus::Pending);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[transfer.clone()]])
                .into_connection(),
        );

        let repo = MonthlyTransferRepository::new(db);
        let found = repo.find_by_period("canteen1", 7, 2025).await.unwrap();

        assert!(found.is_some());
        assert_eq!(found.unwrap().transaction_count, 361);
    }

    #[tokio::test]
    async fn test_apply_transition_reports_affected_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = MonthlyTransferRepository::new(db);
        let affected = repo
            .apply_transition(
                "mt1",
                0,
                TransferStatus::Processing,
                TransferStatus::Failed,
                Some("payout gateway unavailable"),
                Utc::now(),
            )
            .await
            .unwrap();

        assert_eq!(affected, 1);
    }
}
