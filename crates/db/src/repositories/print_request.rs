//! Print request repository.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use escola_common::AppResult;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

use crate::entities::{print_request, print_request::PrintRequestStatus, PrintRequest};

/// Repository for print request operations.
#[derive(Clone)]
pub struct PrintRequestRepository {
    db: Arc<DatabaseConnection>,
}

impl PrintRequestRepository {
    /// Create a new print request repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a print request by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<print_request::Model>> {
        PrintRequest::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }

    /// Create a new print request.
    pub async fn create(
        &self,
        model: print_request::ActiveModel,
    ) -> AppResult<print_request::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }

    /// List print requests for a set of schools, optionally filtered by status.
    pub async fn find_by_schools(
        &self,
        school_ids: &[String],
        statuses: &[PrintRequestStatus],
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<print_request::Model>> {
        let mut query = PrintRequest::find()
            .filter(print_request::Column::SchoolId.is_in(school_ids.iter().cloned()))
            .order_by_desc(print_request::Column::CreatedAt);

        if !statuses.is_empty() {
            query = query.filter(print_request::Column::Status.is_in(statuses.iter().copied()));
        }

        query
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }

    /// Count print requests for a set of schools, optionally filtered by status.
    pub async fn count_by_schools(
        &self,
        school_ids: &[String],
        statuses: &[PrintRequestStatus],
    ) -> AppResult<u64> {
        let mut query = PrintRequest::find()
            .filter(print_request::Column::SchoolId.is_in(school_ids.iter().cloned()));

        if !statuses.is_empty() {
            query = query.filter(print_request::Column::Status.is_in(statuses.iter().copied()));
        }

        query
            .count(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }

    /// Apply a status transition as a compare-and-swap write.
    ///
    /// Stamps the timestamp matching the target state and, when given,
    /// the approver feedback, all in one statement. Returns affected
    /// rows — zero means a concurrent writer won.
    pub async fn apply_transition(
        &self,
        id: &str,
        read_version: i32,
        from: PrintRequestStatus,
        to: PrintRequestStatus,
        feedback: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let now_tz: sea_orm::prelude::DateTimeWithTimeZone = now.into();

        let mut update = PrintRequest::update_many()
            .filter(print_request::Column::Id.eq(id))
            .filter(print_request::Column::Status.eq(from))
            .filter(print_request::Column::Version.eq(read_version))
            .col_expr(print_request::Column::Status, to.into())
            .col_expr(
                print_request::Column::Version,
                Expr::col(print_request::Column::Version).add(1),
            );

        update = match to {
            PrintRequestStatus::Approved => {
                update.col_expr(print_request::Column::ApprovedAt, Some(now_tz).into())
            }
            PrintRequestStatus::Rejected => {
                update.col_expr(print_request::Column::RejectedAt, Some(now_tz).into())
            }
            PrintRequestStatus::Printed => {
                update.col_expr(print_request::Column::PrintedAt, Some(now_tz).into())
            }
            _ => update,
        };

        if let Some(f) = feedback {
            update = update.col_expr(
                print_request::Column::ReviewFeedback,
                Some(f.to_string()).into(),
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
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_request(id: &str, status: PrintRequestStatus) -> print_request::Model {
        print_request::Model {
            id: id.to_string(),
            requester_id: "staff1".to_string(),
            school_id: "school1".to_string(),
            title: "Prova bimestral".to_string(),
            quantity: 30,
            due_date: Utc::now().into(),
            front_and_back: true,
            status,
            review_feedback: None,
            approved_at: None,
            rejected_at: None,
            printed_at: None,
            created_at: Utc::now().into(),
            version: 0,
        }
    }

    #[tokio::test]
    async fn test_find_by_school_filters_status() {
        let req = create_test_request("pr1", PrintRequestStatus::Requested);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[req.clone()]])
                .into_connection(),
        );

        let repo = PrintRequestRepository::new(db);
        let found = repo
            .find_by_schools(
                &["school1".to_string()],
                &[PrintRequestStatus::Requested],
                20,
                0,
            )
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].status, PrintRequestStatus::Requested);
    }

    #[tokio::test]
    async fn test_apply_transition_with_feedback() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = PrintRequestRepository::new(db);
        let affected = repo
            .apply_transition(
                "pr1",
                0,
                PrintRequestStatus::Requested,
                PrintRequestStatus::Rejected,
                Some("Margens fora do padrão"),
                Utc::now(),
            )
            .await
            .unwrap();

        assert_eq!(affected, 1);
    }
}
