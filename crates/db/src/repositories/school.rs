//! School repository.

use std::sync::Arc;

use escola_common::AppResult;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect};

use crate::entities::{school, School};

/// Repository for school lookups.
#[derive(Clone)]
pub struct SchoolRepository {
    db: Arc<DatabaseConnection>,
}

impl SchoolRepository {
    /// Create a new school repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a school by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<school::Model>> {
        School::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }

    /// IDs of all schools in a chain.
    pub async fn find_ids_by_chain(&self, school_chain_id: &str) -> AppResult<Vec<String>> {
        let ids = School::find()
            .select_only()
            .column(school::Column::Id)
            .filter(school::Column::SchoolChainId.eq(school_chain_id))
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)?;

        Ok(ids)
    }
}
