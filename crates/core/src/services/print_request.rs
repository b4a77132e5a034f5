//! Print request service: document print approval workflow.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use escola_common::{AppError, AppResult, PageRequest, Paginated};
use escola_db::entities::{print_request, print_request::PrintRequestStatus};
use escola_db::repositories::{PrintRequestRepository, SchoolRepository};
use sea_orm::{DatabaseConnection, Set};
use validator::Validate;

use crate::aggregate::StatusRollup;
use crate::guard::{self, PrintRequestAction};
use crate::status::{self, EntityKind, StatusVocabulary};
use crate::tenancy::TenantScope;

/// Input for submitting a print request.
#[derive(Debug, Clone, Validate)]
pub struct CreatePrintRequestInput {
    /// Submitting user.
    #[validate(length(min = 1))]
    pub requester_id: String,
    /// School the request belongs to.
    #[validate(length(min = 1))]
    pub school_id: String,
    /// Short description of the job.
    #[validate(length(min = 1, max = 256))]
    pub title: String,
    /// Copies requested.
    #[validate(range(min = 1))]
    pub quantity: i32,
    /// When the copies are needed.
    pub due_date: DateTime<Utc>,
    /// Duplex printing.
    pub front_and_back: bool,
}

/// Print request service for the approval workflow.
#[derive(Clone)]
pub struct PrintRequestService {
    print_repo: PrintRequestRepository,
    school_repo: SchoolRepository,
}

impl PrintRequestService {
    /// Create a new print request service.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            print_repo: PrintRequestRepository::new(db.clone()),
            school_repo: SchoolRepository::new(db),
        }
    }

    /// Submit a print request.
    pub async fn create(
        &self,
        input: CreatePrintRequestInput,
    ) -> AppResult<print_request::Model> {
        input.validate()?;

        self.school_repo
            .find_by_id(&input.school_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("School {} not found", input.school_id)))?;

        let model = print_request::ActiveModel {
            id: Set(crate::generate_id()),
            requester_id: Set(input.requester_id),
            school_id: Set(input.school_id),
            title: Set(input.title),
            quantity: Set(input.quantity),
            due_date: Set(input.due_date.into()),
            front_and_back: Set(input.front_and_back),
            status: Set(PrintRequestStatus::Requested),
            review_feedback: Set(None),
            approved_at: Set(None),
            rejected_at: Set(None),
            printed_at: Set(None),
            created_at: Set(Utc::now().into()),
            version: Set(0),
        };

        self.print_repo.create(model).await
    }

    /// Approve the job for printing.
    pub async fn approve(
        &self,
        scope: &TenantScope,
        actor_id: &str,
        id: &str,
    ) -> AppResult<print_request::Model> {
        self.command(scope, actor_id, id, PrintRequestAction::Approve, None)
            .await
    }

    /// Reject the job. Feedback is mandatory.
    pub async fn reject(
        &self,
        scope: &TenantScope,
        actor_id: &str,
        id: &str,
        feedback: Option<&str>,
    ) -> AppResult<print_request::Model> {
        self.command(scope, actor_id, id, PrintRequestAction::Reject, feedback)
            .await
    }

    /// Send the job back to the requester for edits.
    pub async fn request_changes(
        &self,
        scope: &TenantScope,
        actor_id: &str,
        id: &str,
        feedback: Option<&str>,
    ) -> AppResult<print_request::Model> {
        self.command(
            scope,
            actor_id,
            id,
            PrintRequestAction::RequestChanges,
            feedback,
        )
        .await
    }

    /// Resubmit an edited job; only the original requester may do this.
    pub async fn resubmit(
        &self,
        scope: &TenantScope,
        actor_id: &str,
        id: &str,
    ) -> AppResult<print_request::Model> {
        self.command(scope, actor_id, id, PrintRequestAction::Resubmit, None)
            .await
    }

    /// Mark an approved job as printed.
    pub async fn mark_printed(
        &self,
        scope: &TenantScope,
        actor_id: &str,
        id: &str,
    ) -> AppResult<print_request::Model> {
        self.command(scope, actor_id, id, PrintRequestAction::MarkPrinted, None)
            .await
    }

    async fn command(
        &self,
        scope: &TenantScope,
        actor_id: &str,
        id: &str,
        action: PrintRequestAction,
        feedback: Option<&str>,
    ) -> AppResult<print_request::Model> {
        let record = self
            .print_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Print request {id} not found")))?;

        let school = self
            .school_repo
            .find_by_id(&record.school_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal("Print request references a missing school".to_string())
            })?;
        scope.ensure_school(&school)?;

        if guard::print_request_is_replay(record.status, action) {
            return Ok(record);
        }

        let has_feedback = feedback.is_some_and(|f| !f.trim().is_empty());
        let actor_is_requester = record.requester_id == actor_id;

        guard::print_request_transition(record.status, action, has_feedback, actor_is_requester)
            .into_result()?;

        let affected = self
            .print_repo
            .apply_transition(
                &record.id,
                record.version,
                record.status,
                action.target(),
                feedback,
                Utc::now(),
            )
            .await?;

        if affected == 0 {
            return Err(AppError::Conflict(
                "Print request was modified concurrently".to_string(),
            ));
        }

        tracing::info!(
            print_request_id = %record.id,
            action = action.name(),
            actor_id,
            "Print request transition applied"
        );

        self.print_repo
            .find_by_id(&record.id)
            .await?
            .ok_or_else(|| AppError::Internal("Print request vanished after update".to_string()))
    }

    /// List print requests inside a tenant scope, filtered by raw status
    /// values.
    pub async fn list_for_scope(
        &self,
        scope: &TenantScope,
        status_filters: &[String],
        page: PageRequest,
    ) -> AppResult<Paginated<print_request::Model>> {
        let statuses: Vec<PrintRequestStatus> =
            status::parse_filters(EntityKind::PrintRequest, status_filters)?;

        let school_ids = super::scope_school_ids(&self.school_repo, scope).await?;

        let total = self.print_repo.count_by_schools(&school_ids, &statuses).await?;
        let data = self
            .print_repo
            .find_by_schools(&school_ids, &statuses, page.limit(), page.offset())
            .await?;

        Ok(Paginated::new(data, page, total))
    }

    /// Counts per status for the scope's print requests (overview card).
    pub async fn status_rollup(&self, scope: &TenantScope) -> AppResult<StatusRollup> {
        let school_ids = super::scope_school_ids(&self.school_repo, scope).await?;

        let mut counts = Vec::with_capacity(5);
        for s in [
            PrintRequestStatus::Requested,
            PrintRequestStatus::Approved,
            PrintRequestStatus::Rejected,
            PrintRequestStatus::Printed,
            PrintRequestStatus::Review,
        ] {
            let count = self.print_repo.count_by_schools(&school_ids, &[s]).await?;
            counts.push((s.canonical(), count));
        }

        Ok(StatusRollup::from_counts(counts))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use escola_db::entities::school;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn test_request(id: &str, status: PrintRequestStatus) -> print_request::Model {
        print_request::Model {
            id: id.to_string(),
            requester_id: "staff1".to_string(),
            school_id: "school1".to_string(),
            title: "Prova bimestral".to_string(),
            quantity: 30,
            due_date: (Utc::now() + Duration::days(2)).into(),
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

    #[tokio::test]
    async fn test_reject_without_feedback_is_missing_field() {
        let requested = test_request("pr1", PrintRequestStatus::Requested);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[requested]])
                .append_query_results([[test_school("school1")]])
                .into_connection(),
        );

        let service = PrintRequestService::new(db);
        let err = service
            .reject(&school_scope(), "approver1", "pr1", None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::MissingField(field) if field == "feedback"));
    }

    #[tokio::test]
    async fn test_reject_with_blank_feedback_is_missing_field() {
        let requested = test_request("pr1", PrintRequestStatus::Requested);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[requested]])
                .append_query_results([[test_school("school1")]])
                .into_connection(),
        );

        let service = PrintRequestService::new(db);
        let err = service
            .reject(&school_scope(), "approver1", "pr1", Some("   "))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::MissingField(_)));
    }

    #[tokio::test]
    async fn test_approve_then_printed_path() {
        let requested = test_request("pr1", PrintRequestStatus::Requested);
        let mut approved = requested.clone();
        approved.status = PrintRequestStatus::Approved;
        approved.approved_at = Some(Utc::now().into());
        approved.version = 1;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[requested]])
                .append_query_results([[test_school("school1")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[approved.clone()]])
                .into_connection(),
        );

        let service = PrintRequestService::new(db);
        let result = service
            .approve(&school_scope(), "approver1", "pr1")
            .await
            .unwrap();

        assert_eq!(result.status, PrintRequestStatus::Approved);
    }

    #[tokio::test]
    async fn test_resubmit_by_other_user_is_unauthorized() {
        let in_review = test_request("pr1", PrintRequestStatus::Review);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[in_review]])
                .append_query_results([[test_school("school1")]])
                .into_connection(),
        );

        let service = PrintRequestService::new(db);
        let err = service
            .resubmit(&school_scope(), "someone-else", "pr1")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::UnauthorizedActor));
    }

    #[tokio::test]
    async fn test_resubmit_by_requester_returns_to_requested() {
        let in_review = test_request("pr1", PrintRequestStatus::Review);
        let mut requested = in_review.clone();
        requested.status = PrintRequestStatus::Requested;
        requested.version = 1;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[in_review]])
                .append_query_results([[test_school("school1")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[requested]])
                .into_connection(),
        );

        let service = PrintRequestService::new(db);
        let result = service
            .resubmit(&school_scope(), "staff1", "pr1")
            .await
            .unwrap();

        assert_eq!(result.status, PrintRequestStatus::Requested);
    }

    #[tokio::test]
    async fn test_mark_printed_from_requested_is_invalid_source_state() {
        let requested = test_request("pr1", PrintRequestStatus::Requested);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[requested]])
                .append_query_results([[test_school("school1")]])
                .into_connection(),
        );

        let service = PrintRequestService::new(db);
        let err = service
            .mark_printed(&school_scope(), "printer1", "pr1")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidSourceState { .. }));
    }
}
