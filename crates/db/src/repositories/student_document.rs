//! Student document repository.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use escola_common::AppResult;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

use crate::entities::{student_document, student_document::DocumentStatus, StudentDocument};

/// Repository for student document operations.
#[derive(Clone)]
pub struct StudentDocumentRepository {
    db: Arc<DatabaseConnection>,
}

impl StudentDocumentRepository {
    /// Create a new student document repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a document by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<student_document::Model>> {
        StudentDocument::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }

    /// Create a new document record.
    pub async fn create(
        &self,
        model: student_document::ActiveModel,
    ) -> AppResult<student_document::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }

    /// List documents for a set of students, optionally filtered by status.
    pub async fn find_by_students(
        &self,
        student_ids: &[String],
        statuses: &[DocumentStatus],
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<student_document::Model>> {
        let mut query = StudentDocument::find()
            .filter(student_document::Column::StudentId.is_in(student_ids.iter().cloned()))
            .order_by_desc(student_document::Column::CreatedAt);

        if !statuses.is_empty() {
            query = query.filter(student_document::Column::Status.is_in(statuses.iter().copied()));
        }

        query
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }

    /// Count documents for a set of students, optionally filtered by status.
    pub async fn count_by_students(
        &self,
        student_ids: &[String],
        statuses: &[DocumentStatus],
    ) -> AppResult<u64> {
        let mut query = StudentDocument::find()
            .filter(student_document::Column::StudentId.is_in(student_ids.iter().cloned()));

        if !statuses.is_empty() {
            query = query.filter(student_document::Column::Status.is_in(statuses.iter().copied()));
        }

        query
            .count(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }

    /// Apply a review decision as a compare-and-swap write.
    ///
    /// Stamps reviewer and review time together with the status, and the
    /// rejection reason when given. Returns affected rows — zero means a
    /// concurrent reviewer won.
    pub async fn apply_review(
        &self,
        id: &str,
        read_version: i32,
        to: DocumentStatus,
        reviewer_id: &str,
        rejection_reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let now_tz: sea_orm::prelude::DateTimeWithTimeZone = now.into();

        let mut update = StudentDocument::update_many()
            .filter(student_document::Column::Id.eq(id))
            .filter(student_document::Column::Status.eq(DocumentStatus::Pending))
            .filter(student_document::Column::Version.eq(read_version))
            .col_expr(student_document::Column::Status, to.into())
            .col_expr(
                student_document::Column::ReviewedBy,
                Some(reviewer_id.to_string()).into(),
            )
            .col_expr(student_document::Column::ReviewedAt, Some(now_tz).into())
            .col_expr(
                student_document::Column::Version,
                Expr::col(student_document::Column::Version).add(1),
            );

        if let Some(reason) = rejection_reason {
            update = update.col_expr(
                student_document::Column::RejectionReason,
                Some(reason.to_string()).into(),
            );
        }

        let result = update
            .exec(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)?;

        Ok(result.rows_affected)
    }
}
