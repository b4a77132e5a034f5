//! Database repositories.

#![allow(missing_docs)]

pub mod canteen;
pub mod consent;
pub mod event;
pub mod invoice;
pub mod monthly_transfer;
pub mod plan;
pub mod print_request;
pub mod school;
pub mod student;
pub mod student_document;
pub mod subscription;

pub use canteen::{CanteenRepository, ItemSales, PeriodTotals};
pub use consent::{ConsentDecision, ConsentRepository};
pub use event::EventRepository;
pub use invoice::InvoiceRepository;
pub use monthly_transfer::MonthlyTransferRepository;
pub use plan::PlanRepository;
pub use print_request::PrintRequestRepository;
pub use school::SchoolRepository;
pub use student::StudentRepository;
pub use student_document::StudentDocumentRepository;
pub use subscription::SubscriptionRepository;
