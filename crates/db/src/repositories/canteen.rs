//! Canteen repository.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use escola_common::AppResult;
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, QueryFilter, QueryOrder,
    QuerySelect,
};

use crate::entities::{canteen, canteen_transaction, Canteen, CanteenTransaction};

/// Sales totals for one canteen over a settlement window.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct PeriodTotals {
    /// Sum of sale amounts; `None` when the window had no sales.
    pub total_amount: Option<Decimal>,
    /// Number of sales in the window.
    pub transaction_count: i64,
}

/// Units sold per item, for rankings.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct ItemSales {
    /// Item label.
    pub item_name: String,
    /// Total units sold.
    pub total_quantity: i64,
}

/// Repository for canteen and canteen transaction operations.
#[derive(Clone)]
pub struct CanteenRepository {
    db: Arc<DatabaseConnection>,
}

impl CanteenRepository {
    /// Create a new canteen repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a canteen by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<canteen::Model>> {
        Canteen::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }

    /// List canteens for a set of schools.
    pub async fn find_by_schools(&self, school_ids: &[String]) -> AppResult<Vec<canteen::Model>> {
        Canteen::find()
            .filter(canteen::Column::SchoolId.is_in(school_ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }

    /// List every canteen (for the monthly aggregation sweep).
    pub async fn find_all(&self) -> AppResult<Vec<canteen::Model>> {
        Canteen::find()
            .all(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }

    /// Total sales for one canteen inside a time window.
    pub async fn period_totals(
        &self,
        canteen_id: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> AppResult<PeriodTotals> {
        let totals = CanteenTransaction::find()
            .select_only()
            .column_as(canteen_transaction::Column::Amount.sum(), "total_amount")
            .column_as(canteen_transaction::Column::Id.count(), "transaction_count")
            .filter(canteen_transaction::Column::CanteenId.eq(canteen_id))
            .filter(canteen_transaction::Column::CreatedAt.gte(window_start))
            .filter(canteen_transaction::Column::CreatedAt.lt(window_end))
            .into_model::<PeriodTotals>()
            .one(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)?;

        Ok(totals.unwrap_or(PeriodTotals {
            total_amount: None,
            transaction_count: 0,
        }))
    }

    /// Best-selling items for one canteen inside a time window.
    pub async fn top_items(
        &self,
        canteen_id: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        limit: u64,
    ) -> AppResult<Vec<ItemSales>> {
        CanteenTransaction::find()
            .select_only()
            .column(canteen_transaction::Column::ItemName)
            .column_as(
                canteen_transaction::Column::Quantity.sum(),
                "total_quantity",
            )
            .filter(canteen_transaction::Column::CanteenId.eq(canteen_id))
            .filter(canteen_transaction::Column::CreatedAt.gte(window_start))
            .filter(canteen_transaction::Column::CreatedAt.lt(window_end))
            .group_by(canteen_transaction::Column::ItemName)
            .order_by_desc(canteen_transaction::Column::Quantity.sum())
            .limit(limit)
            .into_model::<ItemSales>()
            .all(self.db.as_ref())
            .await
            .map_err(crate::map_db_err)
    }
}
