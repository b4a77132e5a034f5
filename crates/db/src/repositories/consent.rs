//! Consent repository.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use escola_common::AppResult;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

use crate::entities::{consent, consent::ConsentStatus, Consent};

/// The decision written by a consent transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentDecision {
    /// Approve, stamping `approved_at`.
    Approve,
    /// Deny, stamping `denied_at`.
    Deny,
}

/// Repository for consent operations.
#[derive(Clone)]
pub struct ConsentRepository {
    db: Arc<DatabaseConnection>,
}

impl ConsentRepository {
    /// Create a new consent repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a consent by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<consent::Model>> {
        Consent::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }

    /// Create a new consent request.
    pub async fn create(&self, model: consent::ActiveModel) -> AppResult<consent::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }

    /// List consents for a set of events, optionally filtered by status.
    pub async fn find_by_events(
        &self,
        event_ids: &[String],
        statuses: &[ConsentStatus],
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<consent::Model>> {
        let mut query = Consent::find()
            .filter(consent::Column::EventId.is_in(event_ids.iter().cloned()))
            .order_by_desc(consent::Column::RequestedAt);

        if !statuses.is_empty() {
            query = query.filter(consent::Column::Status.is_in(statuses.iter().copied()));
        }

        query
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }

    /// Count consents for a set of events, optionally filtered by status.
    pub async fn count_by_events(
        &self,
        event_ids: &[String],
        statuses: &[ConsentStatus],
    ) -> AppResult<u64> {
        let mut query =
            Consent::find().filter(consent::Column::EventId.is_in(event_ids.iter().cloned()));

        if !statuses.is_empty() {
            query = query.filter(consent::Column::Status.is_in(statuses.iter().copied()));
        }

        query
            .count(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }

    /// List consents awaiting a given guardian.
    pub async fn find_pending_for_responsible(
        &self,
        responsible_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<consent::Model>> {
        Consent::find()
            .filter(consent::Column::ResponsibleId.eq(responsible_id))
            .filter(consent::Column::Status.eq(ConsentStatus::Pending))
            .order_by_desc(consent::Column::RequestedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }

    /// Count consents awaiting a given guardian.
    pub async fn count_pending_for_responsible(&self, responsible_id: &str) -> AppResult<u64> {
        Consent::find()
            .filter(consent::Column::ResponsibleId.eq(responsible_id))
            .filter(consent::Column::Status.eq(ConsentStatus::Pending))
            .count(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }

    /// Count consents per status for a set of events (dashboard rollups).
    pub async fn count_status(
        &self,
        event_ids: &[String],
        status: ConsentStatus,
    ) -> AppResult<u64> {
        Consent::find()
            .filter(consent::Column::EventId.is_in(event_ids.iter().cloned()))
            .filter(consent::Column::Status.eq(status))
            .count(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }

    /// Apply a guardian decision as a compare-and-swap write.
    ///
    /// The UPDATE re-checks that the row is still `Pending` at the version
    /// the caller read; the status, decision timestamp, and notes land in
    /// one statement. Returns the number of rows affected — zero means the
    /// row changed underneath the caller.
    pub async fn apply_decision(
        &self,
        id: &str,
        read_version: i32,
        decision: ConsentDecision,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let now_tz: sea_orm::prelude::DateTimeWithTimeZone = now.into();

        let mut update = Consent::update_many()
            .filter(consent::Column::Id.eq(id))
            .filter(consent::Column::Status.eq(ConsentStatus::Pending))
            .filter(consent::Column::Version.eq(read_version))
            .col_expr(
                consent::Column::Version,
                Expr::col(consent::Column::Version).add(1),
            );

        update = match decision {
            ConsentDecision::Approve => update
                .col_expr(consent::Column::Status, ConsentStatus::Approved.into())
                .col_expr(consent::Column::ApprovedAt, Some(now_tz).into()),
            ConsentDecision::Deny => update
                .col_expr(consent::Column::Status, ConsentStatus::Denied.into())
                .col_expr(consent::Column::DeniedAt, Some(now_tz).into()),
        };

        if let Some(n) = notes {
            update = update.col_expr(consent::Column::Notes, Some(n.to_string()).into());
        }

        let result = update
            .exec(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)?;

        Ok(result.rows_affected)
    }

    /// Expire pending consents whose deadline has passed.
    ///
    /// Only touches rows still `Pending`, so the sweep can never overwrite
    /// a decision a guardian made a moment earlier. Idempotent: re-running
    /// over already-expired rows affects nothing.
    pub async fn sweep_expire(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = Consent::update_many()
            .filter(consent::Column::Status.eq(ConsentStatus::Pending))
            .filter(consent::Column::ExpiresAt.is_not_null())
            .filter(consent::Column::ExpiresAt.lt(now))
            .col_expr(consent::Column::Status, ConsentStatus::Expired.into())
            .col_expr(
                consent::Column::Version,
                Expr::col(consent::Column::Version).add(1),
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
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_consent(id: &str, status: ConsentStatus) -> consent::Model {
        consent::Model {
            id: id.to_string(),
            event_id: "event1".to_string(),
            student_id: "student1".to_string(),
            responsible_id: "guardian1".to_string(),
            status,
            notes: None,
            requested_at: Utc::now().into(),
            approved_at: None,
            denied_at: None,
            expires_at: None,
            version: 0,
        }
    }

    #[tokio::test]
    async fn test_find_by_id_returns_consent() {
        let consent = create_test_consent("c1", ConsentStatus::Pending);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[consent.clone()]])
                .into_connection(),
        );

        let repo = ConsentRepository::new(db);
        let found = repo.find_by_id("c1").await.unwrap().unwrap();

        assert_eq!(found.id, "c1");
        assert_eq!(found.status, ConsentStatus::Pending);
    }

    #[tokio::test]
    async fn test_find_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<consent::Model>::new()])
                .into_connection(),
        );

        let repo = ConsentRepository::new(db);
        let result = repo.find_by_id("missing").await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_apply_decision_reports_affected_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = ConsentRepository::new(db);
        let affected = repo
            .apply_decision("c1", 0, ConsentDecision::Approve, None, Utc::now())
            .await
            .unwrap();

        assert_eq!(affected, 1);
    }

    #[tokio::test]
    async fn test_apply_decision_stale_version_affects_nothing() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = ConsentRepository::new(db);
        let affected = repo
            .apply_decision("c1", 3, ConsentDecision::Deny, Some("sick"), Utc::now())
            .await
            .unwrap();

        assert_eq!(affected, 0);
    }

    #[tokio::test]
    async fn test_sweep_expire_reports_affected_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 7,
                }])
                .into_connection(),
        );

        let repo = ConsentRepository::new(db);
        let affected = repo.sweep_expire(Utc::now()).await.unwrap();

        assert_eq!(affected, 7);
    }
}
