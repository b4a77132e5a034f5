//! Student document service: compliance document review.

use std::sync::Arc;

use chrono::Utc;
use escola_common::{AppError, AppResult, PageRequest, Paginated};
use escola_db::entities::{student_document, student_document::DocumentStatus};
use escola_db::repositories::{SchoolRepository, StudentDocumentRepository, StudentRepository};
use sea_orm::{DatabaseConnection, Set};
use validator::Validate;

use crate::aggregate::StatusRollup;
use crate::guard::{self, DocumentAction};
use crate::status::{self, EntityKind, StatusVocabulary};
use crate::tenancy::TenantScope;

/// Input for submitting a document for review.
#[derive(Debug, Clone, Validate)]
pub struct SubmitDocumentInput {
    /// Student the document belongs to.
    #[validate(length(min = 1))]
    pub student_id: String,
    /// Kind of document (vaccination card, transfer record, ...).
    #[validate(length(min = 1, max = 64))]
    pub document_type: String,
}

/// Student document service for the review workflow.
#[derive(Clone)]
pub struct StudentDocumentService {
    document_repo: StudentDocumentRepository,
    student_repo: StudentRepository,
    school_repo: SchoolRepository,
}

impl StudentDocumentService {
    /// Create a new student document service.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            document_repo: StudentDocumentRepository::new(db.clone()),
            student_repo: StudentRepository::new(db.clone()),
            school_repo: SchoolRepository::new(db),
        }
    }

    /// Submit a document for staff review.
    pub async fn submit(&self, input: SubmitDocumentInput) -> AppResult<student_document::Model> {
        input.validate()?;

        self.student_repo
            .find_by_id(&input.student_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Student {} not found", input.student_id))
            })?;

        let model = student_document::ActiveModel {
            id: Set(crate::generate_id()),
            student_id: Set(input.student_id),
            document_type: Set(input.document_type),
            status: Set(DocumentStatus::Pending),
            rejection_reason: Set(None),
            reviewed_by: Set(None),
            reviewed_at: Set(None),
            created_at: Set(Utc::now().into()),
            version: Set(0),
        };

        self.document_repo.create(model).await
    }

    /// Approve a document.
    pub async fn approve(
        &self,
        scope: &TenantScope,
        reviewer_id: &str,
        id: &str,
    ) -> AppResult<student_document::Model> {
        self.review(scope, reviewer_id, id, DocumentAction::Approve, None)
            .await
    }

    /// Reject a document. A reason is mandatory.
    pub async fn reject(
        &self,
        scope: &TenantScope,
        reviewer_id: &str,
        id: &str,
        reason: Option<&str>,
    ) -> AppResult<student_document::Model> {
        self.review(scope, reviewer_id, id, DocumentAction::Reject, reason)
            .await
    }

    async fn review(
        &self,
        scope: &TenantScope,
        reviewer_id: &str,
        id: &str,
        action: DocumentAction,
        reason: Option<&str>,
    ) -> AppResult<student_document::Model> {
        let record = self
            .document_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document {id} not found")))?;

        self.ensure_in_scope(scope, &record).await?;

        if guard::document_is_replay(record.status, action) {
            return Ok(record);
        }

        let has_reason = reason.is_some_and(|r| !r.trim().is_empty());
        guard::document_review(record.status, action, has_reason).into_result()?;

        let affected = self
            .document_repo
            .apply_review(
                &record.id,
                record.version,
                action.target(),
                reviewer_id,
                reason,
                Utc::now(),
            )
            .await?;

        if affected == 0 {
            return Err(AppError::Conflict(
                "Document was reviewed concurrently".to_string(),
            ));
        }

        tracing::info!(
            document_id = %record.id,
            action = action.name(),
            reviewer_id,
            "Document review recorded"
        );

        self.document_repo
            .find_by_id(&record.id)
            .await?
            .ok_or_else(|| AppError::Internal("Document vanished after update".to_string()))
    }

    /// List documents inside a tenant scope, filtered by raw status values.
    pub async fn list_for_scope(
        &self,
        scope: &TenantScope,
        status_filters: &[String],
        page: PageRequest,
    ) -> AppResult<Paginated<student_document::Model>> {
        let statuses: Vec<DocumentStatus> =
            status::parse_filters(EntityKind::StudentDocument, status_filters)?;

        let school_ids = super::scope_school_ids(&self.school_repo, scope).await?;
        let student_ids = self.student_repo.find_ids_by_schools(&school_ids).await?;

        let total = self
            .document_repo
            .count_by_students(&student_ids, &statuses)
            .await?;
        let data = self
            .document_repo
            .find_by_students(&student_ids, &statuses, page.limit(), page.offset())
            .await?;

        Ok(Paginated::new(data, page, total))
    }

    /// Counts per status for the scope's documents (overview card).
    pub async fn status_rollup(&self, scope: &TenantScope) -> AppResult<StatusRollup> {
        let school_ids = super::scope_school_ids(&self.school_repo, scope).await?;
        let student_ids = self.student_repo.find_ids_by_schools(&school_ids).await?;

        let mut counts = Vec::with_capacity(3);
        for s in [
            DocumentStatus::Pending,
            DocumentStatus::Approved,
            DocumentStatus::Rejected,
        ] {
            let count = self
                .document_repo
                .count_by_students(&student_ids, &[s])
                .await?;
            counts.push((s.canonical(), count));
        }

        Ok(StatusRollup::from_counts(counts))
    }

    async fn ensure_in_scope(
        &self,
        scope: &TenantScope,
        record: &student_document::Model,
    ) -> AppResult<()> {
        let student = self
            .student_repo
            .find_by_id(&record.student_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal("Document references a missing student".to_string())
            })?;

        let school = self
            .school_repo
            .find_by_id(&student.school_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal("Student references a missing school".to_string())
            })?;

        scope.ensure_school(&school)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use escola_db::entities::{school, student};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn test_document(id: &str, status: DocumentStatus) -> student_document::Model {
        student_document::Model {
            id: id.to_string(),
            student_id: "student1".to_string(),
            document_type: "vaccination_card".to_string(),
            status,
            rejection_reason: None,
            reviewed_by: None,
            reviewed_at: None,
            created_at: Utc::now().into(),
            version: 0,
        }
    }

    fn test_student(id: &str) -> student::Model {
        student::Model {
            id: id.to_string(),
            school_id: "school1".to_string(),
            name: "Ana Souza".to_string(),
            enrolled_at: Utc::now().into(),
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
    async fn test_reject_without_reason_is_missing_field() {
        let pending = test_document("doc1", DocumentStatus::Pending);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[pending]])
                .append_query_results([[test_student("student1")]])
                .append_query_results([[test_school("school1")]])
                .into_connection(),
        );

        let service = StudentDocumentService::new(db);
        let err = service
            .reject(&school_scope(), "staff1", "doc1", None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::MissingField(field) if field == "rejection_reason"));
    }

    #[tokio::test]
    async fn test_approve_pending_document_stamps_reviewer() {
        let pending = test_document("doc1", DocumentStatus::Pending);
        let mut approved = pending.clone();
        approved.status = DocumentStatus::Approved;
        approved.reviewed_by = Some("staff1".to_string());
        approved.reviewed_at = Some(Utc::now().into());
        approved.version = 1;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[pending]])
                .append_query_results([[test_student("student1")]])
                .append_query_results([[test_school("school1")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[approved]])
                .into_connection(),
        );

        let service = StudentDocumentService::new(db);
        let result = service
            .approve(&school_scope(), "staff1", "doc1")
            .await
            .unwrap();

        assert_eq!(result.status, DocumentStatus::Approved);
        assert_eq!(result.reviewed_by.as_deref(), Some("staff1"));
        assert!(result.reviewed_at.is_some());
    }

    #[tokio::test]
    async fn test_review_of_decided_document_is_invalid_source_state() {
        let mut rejected = test_document("doc1", DocumentStatus::Rejected);
        rejected.rejection_reason = Some("Documento ilegível".to_string());

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[rejected]])
                .append_query_results([[test_student("student1")]])
                .append_query_results([[test_school("school1")]])
                .into_connection(),
        );

        let service = StudentDocumentService::new(db);
        let err = service
            .approve(&school_scope(), "staff1", "doc1")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidSourceState { .. }));
    }
}
