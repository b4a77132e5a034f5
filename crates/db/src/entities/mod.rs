//! Database entities.

#![allow(missing_docs)]

pub mod canteen;
pub mod canteen_transaction;
pub mod consent;
pub mod event;
pub mod guardian_student;
pub mod invoice;
pub mod monthly_transfer;
pub mod plan;
pub mod print_request;
pub mod school;
pub mod school_chain;
pub mod student;
pub mod student_document;
pub mod subscription;

pub use canteen::Entity as Canteen;
pub use canteen_transaction::Entity as CanteenTransaction;
pub use consent::Entity as Consent;
pub use event::Entity as Event;
pub use guardian_student::Entity as GuardianStudent;
pub use invoice::Entity as Invoice;
pub use monthly_transfer::Entity as MonthlyTransfer;
pub use plan::Entity as Plan;
pub use print_request::Entity as PrintRequest;
pub use school::Entity as School;
pub use school_chain::Entity as SchoolChain;
pub use student::Entity as Student;
pub use student_document::Entity as StudentDocument;
pub use subscription::Entity as Subscription;
