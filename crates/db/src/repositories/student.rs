//! Student repository.

use std::sync::Arc;

use escola_common::AppResult;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect};

use crate::entities::{guardian_student, student, GuardianStudent, Student};

/// Repository for student and guardian-link lookups.
#[derive(Clone)]
pub struct StudentRepository {
    db: Arc<DatabaseConnection>,
}

impl StudentRepository {
    /// Create a new student repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a student by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<student::Model>> {
        Student::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }

    /// IDs of all students enrolled at a set of schools.
    pub async fn find_ids_by_schools(&self, school_ids: &[String]) -> AppResult<Vec<String>> {
        let ids = Student::find()
            .select_only()
            .column(student::Column::Id)
            .filter(student::Column::SchoolId.is_in(school_ids.iter().cloned()))
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)?;

        Ok(ids)
    }

    /// The link row between a guardian and a student, if any.
    pub async fn find_guardian_link(
        &self,
        guardian_id: &str,
        student_id: &str,
    ) -> AppResult<Option<guardian_student::Model>> {
        GuardianStudent::find()
            .filter(guardian_student::Column::GuardianId.eq(guardian_id))
            .filter(guardian_student::Column::StudentId.eq(student_id))
            .one(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }
}
