//! Common utilities and shared types for escola.
//!
//! This crate provides foundational components used across all escola crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Pagination**: Page requests and metadata via [`PageRequest`] and [`Paginated`]
//!
//! # Example
//!
//! ```no_run
//! use escola_common::{AppResult, Config, IdGenerator};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Generated ID: {}", id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod pagination;

pub use config::{BillingPolicy, Config, DatabaseConfig, SweepConfig};
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use pagination::{PageMeta, PageRequest, Paginated, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
