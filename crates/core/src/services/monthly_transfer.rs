//! Monthly transfer service: canteen payout settlement.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use escola_common::{AppError, AppResult, PageRequest, Paginated};
use escola_db::entities::{monthly_transfer, monthly_transfer::TransferStatus};
use escola_db::repositories::{
    CanteenRepository, ItemSales, MonthlyTransferRepository, SchoolRepository,
};
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, Set};

use crate::aggregate::StatusRollup;
use crate::guard::{self, TransferAction};
use crate::status::{self, EntityKind, StatusVocabulary};
use crate::tenancy::TenantScope;

/// Monthly transfer service: aggregation and settlement of canteen
/// payouts.
#[derive(Clone)]
pub struct MonthlyTransferService {
    transfer_repo: MonthlyTransferRepository,
    canteen_repo: CanteenRepository,
    school_repo: SchoolRepository,
}

impl MonthlyTransferService {
    /// Create a new monthly transfer service.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            transfer_repo: MonthlyTransferRepository::new(db.clone()),
            canteen_repo: CanteenRepository::new(db.clone()),
            school_repo: SchoolRepository::new(db),
        }
    }

    /// Aggregate one canteen's sales for a settlement period into a
    /// transfer row.
    ///
    /// Idempotent: when the (canteen, month, year) row already exists it
    /// is returned untouched, whatever its settlement state.
    pub async fn aggregate_period(
        &self,
        canteen_id: &str,
        month: i32,
        year: i32,
    ) -> AppResult<monthly_transfer::Model> {
        self.canteen_repo
            .find_by_id(canteen_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Canteen {canteen_id} not found")))?;

        if let Some(existing) = self
            .transfer_repo
            .find_by_period(canteen_id, month, year)
            .await?
        {
            return Ok(existing);
        }

        let (window_start, window_end) = month_window(month, year)?;
        let totals = self
            .canteen_repo
            .period_totals(canteen_id, window_start, window_end)
            .await?;

        let model = monthly_transfer::ActiveModel {
            id: Set(crate::generate_id()),
            canteen_id: Set(canteen_id.to_string()),
            month: Set(month),
            year: Set(year),
            total_amount: Set(totals.total_amount.unwrap_or(Decimal::ZERO)),
            transaction_count: Set(i32::try_from(totals.transaction_count).unwrap_or(i32::MAX)),
            status: Set(TransferStatus::Pending),
            processed_at: Set(None),
            error_message: Set(None),
            created_at: Set(Utc::now().into()),
            version: Set(0),
        };

        let created = self.transfer_repo.create(model).await?;

        tracing::info!(
            canteen_id,
            month,
            year,
            transaction_count = created.transaction_count,
            "Monthly transfer aggregated"
        );

        Ok(created)
    }

    /// Aggregate every canteen for one settlement period. Returns how
    /// many new transfer rows were created.
    pub async fn aggregate_month(&self, month: i32, year: i32) -> AppResult<u64> {
        let canteens = self.canteen_repo.find_all().await?;
        let mut created = 0;

        for canteen in canteens {
            let existing = self
                .transfer_repo
                .find_by_period(&canteen.id, month, year)
                .await?;
            if existing.is_none() {
                self.aggregate_period(&canteen.id, month, year).await?;
                created += 1;
            }
        }

        Ok(created)
    }

    /// Pick a pending payout up for processing.
    pub async fn start_processing(
        &self,
        scope: &TenantScope,
        id: &str,
    ) -> AppResult<monthly_transfer::Model> {
        self.settle(scope, id, TransferAction::StartProcessing, None)
            .await
    }

    /// Mark an in-flight payout as settled.
    pub async fn complete(
        &self,
        scope: &TenantScope,
        id: &str,
    ) -> AppResult<monthly_transfer::Model> {
        self.settle(scope, id, TransferAction::Complete, None).await
    }

    /// Mark an in-flight payout as failed.
    pub async fn fail(
        &self,
        scope: &TenantScope,
        id: &str,
        error_message: &str,
    ) -> AppResult<monthly_transfer::Model> {
        self.settle(scope, id, TransferAction::Fail, Some(error_message))
            .await
    }

    /// Queue a failed payout again.
    pub async fn retry(
        &self,
        scope: &TenantScope,
        id: &str,
    ) -> AppResult<monthly_transfer::Model> {
        self.settle(scope, id, TransferAction::Retry, None).await
    }

    async fn settle(
        &self,
        scope: &TenantScope,
        id: &str,
        action: TransferAction,
        error_message: Option<&str>,
    ) -> AppResult<monthly_transfer::Model> {
        let record = self
            .transfer_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Monthly transfer {id} not found")))?;

        self.ensure_in_scope(scope, &record).await?;

        if guard::transfer_is_replay(record.status, action) {
            return Ok(record);
        }

        guard::transfer_transition(record.status, action).into_result()?;

        let affected = self
            .transfer_repo
            .apply_transition(
                &record.id,
                record.version,
                record.status,
                action.target(),
                error_message,
                Utc::now(),
            )
            .await?;

        if affected == 0 {
            return Err(AppError::Conflict(
                "Monthly transfer was modified concurrently".to_string(),
            ));
        }

        tracing::info!(
            transfer_id = %record.id,
            action = action.name(),
            "Monthly transfer transition applied"
        );

        self.transfer_repo
            .find_by_id(&record.id)
            .await?
            .ok_or_else(|| {
                AppError::Internal("Monthly transfer vanished after update".to_string())
            })
    }

    /// List transfers inside a tenant scope, filtered by raw status
    /// values.
    pub async fn list_for_scope(
        &self,
        scope: &TenantScope,
        status_filters: &[String],
        page: PageRequest,
    ) -> AppResult<Paginated<monthly_transfer::Model>> {
        let statuses: Vec<TransferStatus> =
            status::parse_filters(EntityKind::MonthlyTransfer, status_filters)?;

        let canteen_ids = self.scoped_canteen_ids(scope).await?;

        let total = self
            .transfer_repo
            .count_by_canteens(&canteen_ids, &statuses)
            .await?;
        let data = self
            .transfer_repo
            .find_by_canteens(&canteen_ids, &statuses, page.limit(), page.offset())
            .await?;

        Ok(Paginated::new(data, page, total))
    }

    /// Counts per status for the scope's transfers (overview card).
    pub async fn status_rollup(&self, scope: &TenantScope) -> AppResult<StatusRollup> {
        let canteen_ids = self.scoped_canteen_ids(scope).await?;

        let mut counts = Vec::with_capacity(4);
        for s in [
            TransferStatus::Pending,
            TransferStatus::Processing,
            TransferStatus::Completed,
            TransferStatus::Failed,
        ] {
            let count = self
                .transfer_repo
                .count_by_canteens(&canteen_ids, &[s])
                .await?;
            counts.push((s.canonical(), count));
        }

        Ok(StatusRollup::from_counts(counts))
    }

    /// Best-selling items for a canteen and settlement period.
    pub async fn top_items(
        &self,
        scope: &TenantScope,
        canteen_id: &str,
        month: i32,
        year: i32,
        limit: u64,
    ) -> AppResult<Vec<ItemSales>> {
        let canteen = self
            .canteen_repo
            .find_by_id(canteen_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Canteen {canteen_id} not found")))?;

        let school = self
            .school_repo
            .find_by_id(&canteen.school_id)
            .await?
            .ok_or_else(|| AppError::Internal("Canteen references a missing school".to_string()))?;
        scope.ensure_school(&school)?;

        let (window_start, window_end) = month_window(month, year)?;
        self.canteen_repo
            .top_items(canteen_id, window_start, window_end, limit)
            .await
    }

    async fn scoped_canteen_ids(&self, scope: &TenantScope) -> AppResult<Vec<String>> {
        let school_ids = super::scope_school_ids(&self.school_repo, scope).await?;
        let canteens = self.canteen_repo.find_by_schools(&school_ids).await?;
        Ok(canteens.into_iter().map(|c| c.id).collect())
    }

    async fn ensure_in_scope(
        &self,
        scope: &TenantScope,
        record: &monthly_transfer::Model,
    ) -> AppResult<()> {
        let canteen = self
            .canteen_repo
            .find_by_id(&record.canteen_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal("Transfer references a missing canteen".to_string())
            })?;

        let school = self
            .school_repo
            .find_by_id(&canteen.school_id)
            .await?
            .ok_or_else(|| AppError::Internal("Canteen references a missing school".to_string()))?;

        scope.ensure_school(&school)
    }
}

/// UTC time window covering one settlement month: `[start, end)`.
fn month_window(month: i32, year: i32) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
    if !(1..=12).contains(&month) {
        return Err(AppError::Validation(format!(
            "Settlement month {month} is out of range"
        )));
    }

    let month_u32 = u32::try_from(month)
        .map_err(|_| AppError::Validation(format!("Settlement month {month} is out of range")))?;

    let start = Utc
        .with_ymd_and_hms(year, month_u32, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| AppError::Validation("Invalid settlement period".to_string()))?;

    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month_u32 + 1)
    };
    let end = Utc
        .with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| AppError::Validation("Invalid settlement period".to_string()))?;

    Ok((start, end))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use escola_db::entities::{canteen, school};
    use maplit::btreemap;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};

    fn test_transfer(id: &str, status: TransferStatus) -> monthly_transfer::Model {
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

    fn test_canteen(id: &str) -> canteen::Model {
        canteen::Model {
            id: id.to_string(),
            school_id: "school1".to_string(),
            name: "Cantina Central".to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn test_school(id: &str) -> school::Model {
        school::Model {
            id: id.to_string(),
            school_chain_id: None,
            name: "Colégio Horizonte".to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn school_scope() -> TenantScope {
        TenantScope::School("school1".to_string())
    }

    #[test]
    fn test_month_window_bounds() {
        let (start, end) = month_window(7, 2025).unwrap();
        assert_eq!(start.to_rfc3339(), "2025-07-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2025-08-01T00:00:00+00:00");
    }

    #[test]
    fn test_month_window_december_rolls_year() {
        let (start, end) = month_window(12, 2025).unwrap();
        assert_eq!(start.to_rfc3339(), "2025-12-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2026-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_month_window_rejects_out_of_range() {
        assert!(month_window(0, 2025).is_err());
        assert!(month_window(13, 2025).is_err());
    }

    #[tokio::test]
    async fn test_aggregate_period_returns_existing_row() {
        // One transfer per (canteen, month, year): re-aggregating an
        // existing period returns the row untouched.
        let existing = test_transfer("mt1", TransferStatus::Completed);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_canteen("canteen1")]])
                .append_query_results([[existing.clone()]])
                .into_connection(),
        );

        let service = MonthlyTransferService::new(db);
        let result = service.aggregate_period("canteen1", 7, 2025).await.unwrap();

        assert_eq!(result.id, "mt1");
        assert_eq!(result.status, TransferStatus::Completed);
    }

    #[tokio::test]
    async fn test_aggregate_period_creates_pending_row() {
        let created = test_transfer("mt2", TransferStatus::Pending);
        let totals_row = btreemap! {
            "total_amount" => Value::from(dec!(4820.50)),
            "transaction_count" => Value::from(361i64),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_canteen("canteen1")]])
                .append_query_results([Vec::<monthly_transfer::Model>::new()])
                .append_query_results([[totals_row]])
                .append_query_results([[created.clone()]])
                .into_connection(),
        );

        let service = MonthlyTransferService::new(db);
        let result = service.aggregate_period("canteen1", 7, 2025).await.unwrap();

        assert_eq!(result.status, TransferStatus::Pending);
        assert_eq!(result.total_amount, dec!(4820.50));
        assert_eq!(result.transaction_count, 361);
    }

    #[tokio::test]
    async fn test_complete_requires_processing() {
        let pending = test_transfer("mt1", TransferStatus::Pending);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[pending]])
                .append_query_results([[test_canteen("canteen1")]])
                .append_query_results([[test_school("school1")]])
                .into_connection(),
        );

        let service = MonthlyTransferService::new(db);
        let err = service.complete(&school_scope(), "mt1").await.unwrap_err();

        assert!(matches!(err, AppError::InvalidSourceState { .. }));
    }

    #[tokio::test]
    async fn test_fail_records_error_message() {
        let processing = test_transfer("mt1", TransferStatus::Processing);
        let mut failed = processing.clone();
        failed.status = TransferStatus::Failed;
        failed.error_message = Some("payout gateway unavailable".to_string());
        failed.processed_at = Some(Utc::now().into());
        failed.version = 1;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[processing]])
                .append_query_results([[test_canteen("canteen1")]])
                .append_query_results([[test_school("school1")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[failed]])
                .into_connection(),
        );

        let service = MonthlyTransferService::new(db);
        let result = service
            .fail(&school_scope(), "mt1", "payout gateway unavailable")
            .await
            .unwrap();

        assert_eq!(result.status, TransferStatus::Failed);
        assert!(result.error_message.is_some());
        assert!(result.processed_at.is_some());
    }
}
