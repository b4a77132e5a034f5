//! Pagination types for the query boundary.

use serde::{Deserialize, Serialize};

/// Smallest accepted page size.
pub const MIN_PAGE_LIMIT: u64 = 1;
/// Largest accepted page size.
pub const MAX_PAGE_LIMIT: u64 = 100;
/// Page size used when the caller does not supply one.
pub const DEFAULT_PAGE_LIMIT: u64 = 20;

/// Default 1-based page number when the caller does not supply one.
fn default_page() -> u64 {
    1
}

/// Default page size when the caller does not supply one.
fn default_limit() -> u64 {
    DEFAULT_PAGE_LIMIT
}

/// A page request from the caller.
///
/// Out-of-range values are clamped rather than rejected, so a query with
/// `limit: 10_000` degrades to the maximum page size instead of failing.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageRequest {
    /// 1-based page number.
    #[serde(default = "default_page")]
    pub page: u64,
    /// Requested page size.
    #[serde(default = "default_limit")]
    pub limit: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl PageRequest {
    /// Create a page request, clamping both fields into their valid ranges.
    #[must_use]
    pub const fn new(page: u64, limit: u64) -> Self {
        let page = if page == 0 { 1 } else { page };
        let limit = if limit < MIN_PAGE_LIMIT {
            MIN_PAGE_LIMIT
        } else if limit > MAX_PAGE_LIMIT {
            MAX_PAGE_LIMIT
        } else {
            limit
        };
        Self { page, limit }
    }

    /// Effective page number (always ≥ 1).
    #[must_use]
    pub const fn page(&self) -> u64 {
        if self.page == 0 { 1 } else { self.page }
    }

    /// Effective page size, clamped into `MIN_PAGE_LIMIT..=MAX_PAGE_LIMIT`.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        if self.limit < MIN_PAGE_LIMIT {
            MIN_PAGE_LIMIT
        } else if self.limit > MAX_PAGE_LIMIT {
            MAX_PAGE_LIMIT
        } else {
            self.limit
        }
    }

    /// Row offset for the effective page.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page() - 1) * self.limit()
    }
}

/// Pagination metadata returned with every page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    /// 1-based page number served.
    pub page: u64,
    /// Page size served.
    pub limit: u64,
    /// Total matching rows.
    pub total: u64,
    /// Last page number (≥ 1 even for empty result sets).
    pub last_page: u64,
}

impl PageMeta {
    /// Build metadata for a request and a total row count.
    #[must_use]
    pub const fn new(request: PageRequest, total: u64) -> Self {
        let limit = request.limit();
        let last_page = if total == 0 { 1 } else { total.div_ceil(limit) };
        Self {
            page: request.page(),
            limit,
            total,
            last_page,
        }
    }
}

/// One page of query results.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    /// The rows on this page.
    pub data: Vec<T>,
    /// Pagination metadata.
    pub meta: PageMeta,
}

impl<T> Paginated<T> {
    /// Assemble a page from rows, the originating request, and the total count.
    #[must_use]
    pub const fn new(data: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            data,
            meta: PageMeta::new(request, total),
        }
    }

    /// Map the rows of this page, keeping the metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}
