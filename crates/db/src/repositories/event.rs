//! Event repository.

use std::sync::Arc;

use escola_common::AppResult;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect};

use crate::entities::{event, Event};

/// Repository for event lookups.
#[derive(Clone)]
pub struct EventRepository {
    db: Arc<DatabaseConnection>,
}

impl EventRepository {
    /// Create a new event repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an event by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<event::Model>> {
        Event::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }

    /// IDs of all events hosted by a set of schools.
    pub async fn find_ids_by_schools(&self, school_ids: &[String]) -> AppResult<Vec<String>> {
        let ids = Event::find()
            .select_only()
            .column(event::Column::Id)
            .filter(event::Column::SchoolId.is_in(school_ids.iter().cloned()))
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)?;

        Ok(ids)
    }
}
