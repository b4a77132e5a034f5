//! Plan repository.

use std::sync::Arc;

use escola_common::AppResult;
use sea_orm::{DatabaseConnection, EntityTrait};

use crate::entities::{plan, Plan};

/// Repository for plan lookups.
#[derive(Clone)]
pub struct PlanRepository {
    db: Arc<DatabaseConnection>,
}

impl PlanRepository {
    /// Create a new plan repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a plan by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<plan::Model>> {
        Plan::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }

    /// List all plans.
    pub async fn find_all(&self) -> AppResult<Vec<plan::Model>> {
        Plan::find()
            .all(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }
}
