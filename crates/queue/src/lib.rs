//! Background sweeps for escola.
//!
//! This crate runs the periodic out-of-band jobs the engine relies on:
//!
//! - **Consent expiry**: pending consents past their deadline
//! - **Invoice overdue**: pending invoices past their due date
//! - **Subscription delinquency**: past-due subscriptions past the
//!   grace period
//! - **Monthly transfers**: aggregating canteen sales into payout rows
//!
//! Sweeps run on tokio intervals and persist derived states with
//! compare-and-swap updates, so they never overwrite a state a user
//! changed a moment earlier.

pub mod scheduler;
pub mod sweeps;

pub use scheduler::{run_scheduler, JobExecutor, ScheduledJob, SchedulerConfig, SchedulerState};
pub use sweeps::SweepExecutor;
