//! Consent service: parental authorization lifecycle.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use escola_common::{AppError, AppResult, PageRequest, Paginated};
use escola_db::entities::{consent, consent::ConsentStatus};
use escola_db::repositories::{
    ConsentDecision, ConsentRepository, EventRepository, SchoolRepository, StudentRepository,
};
use sea_orm::{DatabaseConnection, Set};
use validator::Validate;

use crate::aggregate::StatusRollup;
use crate::expiry;
use crate::guard::{self, ConsentAction};
use crate::status::{self, EntityKind, StatusVocabulary};
use crate::tenancy::TenantScope;

/// Input for creating a consent request.
#[derive(Debug, Clone, Validate)]
pub struct CreateConsentInput {
    /// Event requiring authorization.
    #[validate(length(min = 1))]
    pub event_id: String,
    /// Student whose participation is requested.
    #[validate(length(min = 1))]
    pub student_id: String,
    /// Guardian designated to answer.
    #[validate(length(min = 1))]
    pub responsible_id: String,
    /// Answer deadline; falls back to the event's consent deadline.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Consent service for the parental authorization workflow.
#[derive(Clone)]
pub struct ConsentService {
    consent_repo: ConsentRepository,
    event_repo: EventRepository,
    school_repo: SchoolRepository,
    student_repo: StudentRepository,
}

impl ConsentService {
    /// Create a new consent service.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            consent_repo: ConsentRepository::new(db.clone()),
            event_repo: EventRepository::new(db.clone()),
            school_repo: SchoolRepository::new(db.clone()),
            student_repo: StudentRepository::new(db),
        }
    }

    /// Create a consent request for one student on one event.
    pub async fn create(&self, input: CreateConsentInput) -> AppResult<consent::Model> {
        input.validate()?;

        let event = self
            .event_repo
            .find_by_id(&input.event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", input.event_id)))?;

        if !event.requires_consent {
            return Err(AppError::Validation(
                "Event does not require parental consent".to_string(),
            ));
        }

        let student = self
            .student_repo
            .find_by_id(&input.student_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Student {} not found", input.student_id))
            })?;

        if student.school_id != event.school_id {
            return Err(AppError::Validation(
                "Student is not enrolled at the event's school".to_string(),
            ));
        }

        let link = self
            .student_repo
            .find_guardian_link(&input.responsible_id, &input.student_id)
            .await?;
        if !link.is_some_and(|l| l.is_primary) {
            return Err(AppError::Validation(
                "Responsible party is not the student's primary guardian".to_string(),
            ));
        }

        let now = Utc::now();
        let expires_at = input
            .expires_at
            .or_else(|| event.consent_deadline.map(Into::into));

        let model = consent::ActiveModel {
            id: Set(crate::generate_id()),
            event_id: Set(input.event_id),
            student_id: Set(input.student_id),
            responsible_id: Set(input.responsible_id),
            status: Set(ConsentStatus::Pending),
            notes: Set(None),
            requested_at: Set(now.into()),
            approved_at: Set(None),
            denied_at: Set(None),
            expires_at: Set(expires_at.map(Into::into)),
            version: Set(0),
        };

        self.consent_repo.create(model).await
    }

    /// Approve a consent as the responsible guardian.
    pub async fn approve(
        &self,
        scope: &TenantScope,
        actor_id: &str,
        consent_id: &str,
        notes: Option<&str>,
    ) -> AppResult<consent::Model> {
        self.decide(scope, actor_id, consent_id, ConsentAction::Approve, notes)
            .await
    }

    /// Deny a consent as the responsible guardian.
    pub async fn deny(
        &self,
        scope: &TenantScope,
        actor_id: &str,
        consent_id: &str,
        notes: Option<&str>,
    ) -> AppResult<consent::Model> {
        self.decide(scope, actor_id, consent_id, ConsentAction::Deny, notes)
            .await
    }

    async fn decide(
        &self,
        scope: &TenantScope,
        actor_id: &str,
        consent_id: &str,
        action: ConsentAction,
        notes: Option<&str>,
    ) -> AppResult<consent::Model> {
        let record = self
            .consent_repo
            .find_by_id(consent_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Consent {consent_id} not found")))?;

        self.ensure_in_scope(scope, &record).await?;

        let actor_is_responsible = record.responsible_id == actor_id;
        if !actor_is_responsible {
            return Err(AppError::UnauthorizedActor);
        }

        // Retrying a decision that already landed is a no-op success.
        if guard::consent_is_replay(record.status, action) {
            return Ok(record);
        }

        guard::consent_transition(record.status, action, actor_is_responsible).into_result()?;

        let decision = match action {
            ConsentAction::Approve => ConsentDecision::Approve,
            ConsentAction::Deny => ConsentDecision::Deny,
            ConsentAction::Expire => {
                return Err(AppError::Internal(
                    "Expiry is applied by the sweep, not a command".to_string(),
                ));
            }
        };

        let affected = self
            .consent_repo
            .apply_decision(&record.id, record.version, decision, notes, Utc::now())
            .await?;

        if affected == 0 {
            return Err(AppError::Conflict(
                "Consent was modified concurrently".to_string(),
            ));
        }

        tracing::info!(
            consent_id = %record.id,
            action = action.name(),
            actor_id,
            "Consent decision recorded"
        );

        self.consent_repo
            .find_by_id(&record.id)
            .await?
            .ok_or_else(|| AppError::Internal("Consent vanished after update".to_string()))
    }

    /// List consents inside a tenant scope, filtered by raw status values.
    pub async fn list_for_scope(
        &self,
        scope: &TenantScope,
        status_filters: &[String],
        page: PageRequest,
    ) -> AppResult<Paginated<consent::Model>> {
        let statuses: Vec<ConsentStatus> =
            status::parse_filters(EntityKind::Consent, status_filters)?;

        let school_ids = super::scope_school_ids(&self.school_repo, scope).await?;
        let event_ids = self.event_repo.find_ids_by_schools(&school_ids).await?;

        let total = self.consent_repo.count_by_events(&event_ids, &statuses).await?;
        let data = self
            .consent_repo
            .find_by_events(&event_ids, &statuses, page.limit(), page.offset())
            .await?;

        Ok(Paginated::new(data, page, total))
    }

    /// List a guardian's unanswered consents.
    pub async fn pending_for_guardian(
        &self,
        guardian_id: &str,
        page: PageRequest,
    ) -> AppResult<Paginated<consent::Model>> {
        let total = self
            .consent_repo
            .count_pending_for_responsible(guardian_id)
            .await?;
        let data = self
            .consent_repo
            .find_pending_for_responsible(guardian_id, page.limit(), page.offset())
            .await?;

        Ok(Paginated::new(data, page, total))
    }

    /// Counts per status for the scope's consents (overview card).
    pub async fn status_rollup(&self, scope: &TenantScope) -> AppResult<StatusRollup> {
        let school_ids = super::scope_school_ids(&self.school_repo, scope).await?;
        let event_ids = self.event_repo.find_ids_by_schools(&school_ids).await?;

        let mut counts = Vec::with_capacity(4);
        for s in [
            ConsentStatus::Pending,
            ConsentStatus::Approved,
            ConsentStatus::Denied,
            ConsentStatus::Expired,
        ] {
            let count = self.consent_repo.count_status(&event_ids, s).await?;
            counts.push((s.canonical(), count));
        }

        Ok(StatusRollup::from_counts(counts))
    }

    /// The display status of a consent at `now`, deadline included.
    #[must_use]
    pub fn effective_status(record: &consent::Model, now: DateTime<Utc>) -> ConsentStatus {
        expiry::effective_consent_status(
            record.status,
            record.expires_at.map(Into::into),
            now,
        )
    }

    async fn ensure_in_scope(
        &self,
        scope: &TenantScope,
        record: &consent::Model,
    ) -> AppResult<()> {
        let event = self
            .event_repo
            .find_by_id(&record.event_id)
            .await?
            .ok_or_else(|| AppError::Internal("Consent references a missing event".to_string()))?;

        let school = self
            .school_repo
            .find_by_id(&event.school_id)
            .await?
            .ok_or_else(|| AppError::Internal("Event references a missing school".to_string()))?;

        scope.ensure_school(&school)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use escola_db::entities::{event, school};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn test_consent(id: &str, status: ConsentStatus) -> consent::Model {
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
            expires_at: Some((Utc::now() + Duration::days(7)).into()),
            version: 0,
        }
    }

    fn test_event(id: &str) -> event::Model {
        event::Model {
            id: id.to_string(),
            school_id: "school1".to_string(),
            title: "Passeio ao museu".to_string(),
            starts_at: (Utc::now() + Duration::days(10)).into(),
            requires_consent: true,
            consent_deadline: Some((Utc::now() + Duration::days(7)).into()),
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

    #[tokio::test]
    async fn test_approve_pending_consent() {
        let pending = test_consent("c1", ConsentStatus::Pending);
        let mut approved = pending.clone();
        approved.status = ConsentStatus::Approved;
        approved.approved_at = Some(Utc::now().into());
        approved.version = 1;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[pending]])
                .append_query_results([[test_event("event1")]])
                .append_query_results([[test_school("school1")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[approved]])
                .into_connection(),
        );

        let service = ConsentService::new(db);
        let result = service
            .approve(&school_scope(), "guardian1", "c1", None)
            .await
            .unwrap();

        assert_eq!(result.status, ConsentStatus::Approved);
        assert!(result.approved_at.is_some());
        assert!(result.denied_at.is_none());
    }

    #[tokio::test]
    async fn test_deny_after_approve_is_invalid_source_state() {
        let mut approved = test_consent("c1", ConsentStatus::Approved);
        approved.approved_at = Some(Utc::now().into());

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[approved]])
                .append_query_results([[test_event("event1")]])
                .append_query_results([[test_school("school1")]])
                .into_connection(),
        );

        let service = ConsentService::new(db);
        let err = service
            .deny(&school_scope(), "guardian1", "c1", None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidSourceState { .. }));
    }

    #[tokio::test]
    async fn test_approve_by_non_responsible_is_unauthorized() {
        let pending = test_consent("c1", ConsentStatus::Pending);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[pending]])
                .append_query_results([[test_event("event1")]])
                .append_query_results([[test_school("school1")]])
                .into_connection(),
        );

        let service = ConsentService::new(db);
        let err = service
            .approve(&school_scope(), "someone-else", "c1", None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::UnauthorizedActor));
    }

    #[tokio::test]
    async fn test_approve_outside_scope_is_tenant_mismatch() {
        let pending = test_consent("c1", ConsentStatus::Pending);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[pending]])
                .append_query_results([[test_event("event1")]])
                .append_query_results([[test_school("school1")]])
                .into_connection(),
        );

        let service = ConsentService::new(db);
        let other_scope = TenantScope::School("school2".to_string());
        let err = service
            .approve(&other_scope, "guardian1", "c1", None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::TenantMismatch));
    }

    #[tokio::test]
    async fn test_concurrent_decision_surfaces_conflict() {
        // The CAS write misses because another decision landed between
        // the read and the update.
        let pending = test_consent("c1", ConsentStatus::Pending);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[pending]])
                .append_query_results([[test_event("event1")]])
                .append_query_results([[test_school("school1")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let service = ConsentService::new(db);
        let err = service
            .deny(&school_scope(), "guardian1", "c1", None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_reapproving_approved_consent_is_noop_success() {
        let mut approved = test_consent("c1", ConsentStatus::Approved);
        approved.approved_at = Some(Utc::now().into());

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[approved.clone()]])
                .append_query_results([[test_event("event1")]])
                .append_query_results([[test_school("school1")]])
                .into_connection(),
        );

        let service = ConsentService::new(db);
        let result = service
            .approve(&school_scope(), "guardian1", "c1", None)
            .await
            .unwrap();

        // No exec result was queued: the service never issued a write.
        assert_eq!(result.status, ConsentStatus::Approved);
        assert_eq!(result.version, approved.version);
    }

    #[tokio::test]
    async fn test_effective_status_reflects_deadline() {
        let mut record = test_consent("c1", ConsentStatus::Pending);
        record.expires_at = Some((Utc::now() - Duration::days(1)).into());

        let effective = ConsentService::effective_status(&record, Utc::now());
        assert_eq!(effective, ConsentStatus::Expired);
    }
}
