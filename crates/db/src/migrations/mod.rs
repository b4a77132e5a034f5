//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250801_000001_create_tenancy_tables;
mod m20250801_000002_create_event_and_consent_tables;
mod m20250801_000003_create_billing_tables;
mod m20250801_000004_create_document_tables;
mod m20250801_000005_create_canteen_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250801_000001_create_tenancy_tables::Migration),
            Box::new(m20250801_000002_create_event_and_consent_tables::Migration),
            Box::new(m20250801_000003_create_billing_tables::Migration),
            Box::new(m20250801_000004_create_document_tables::Migration),
            Box::new(m20250801_000005_create_canteen_tables::Migration),
        ]
    }
}
