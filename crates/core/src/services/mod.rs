//! Business logic services: the query/command boundary.

#![allow(missing_docs)]

pub mod consent;
pub mod invoice;
pub mod monthly_transfer;
pub mod print_request;
pub mod student_document;
pub mod subscription;

use escola_common::AppResult;
use escola_db::repositories::SchoolRepository;

use crate::tenancy::TenantScope;

pub use consent::{ConsentService, CreateConsentInput};
pub use invoice::{CreateInvoiceInput, InvoiceService};
pub use monthly_transfer::MonthlyTransferService;
pub use print_request::{CreatePrintRequestInput, PrintRequestService};
pub use student_document::{StudentDocumentService, SubmitDocumentInput};
pub use subscription::{CreateSubscriptionInput, SubscriptionService};

/// Resolve a tenant scope to the school IDs it covers.
pub(crate) async fn scope_school_ids(
    school_repo: &SchoolRepository,
    scope: &TenantScope,
) -> AppResult<Vec<String>> {
    match scope {
        TenantScope::School(id) => Ok(vec![id.clone()]),
        TenantScope::Chain(id) => school_repo.find_ids_by_chain(id).await,
    }
}
