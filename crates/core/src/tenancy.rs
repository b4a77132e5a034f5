//! Tenant scoping.
//!
//! Every query and command is bounded to one school or one chain. The
//! scope is an enum rather than a pair of optional IDs, so "both set"
//! and "neither set" are unrepresentable at the boundary.

use escola_common::{AppError, AppResult};
use escola_db::entities::school;

/// The tenant boundary a caller is authorized for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantScope {
    /// A single school.
    School(String),
    /// A whole school chain.
    Chain(String),
}

impl TenantScope {
    /// The school ID, when scoped to a school.
    #[must_use]
    pub fn school_id(&self) -> Option<&str> {
        match self {
            Self::School(id) => Some(id),
            Self::Chain(_) => None,
        }
    }

    /// The chain ID, when scoped to a chain.
    #[must_use]
    pub fn chain_id(&self) -> Option<&str> {
        match self {
            Self::School(_) => None,
            Self::Chain(id) => Some(id),
        }
    }

    /// Check that a school row falls inside this scope.
    ///
    /// A school scope must name the school itself; a chain scope must be
    /// the chain the school belongs to.
    pub fn ensure_school(&self, school: &school::Model) -> AppResult<()> {
        let inside = match self {
            Self::School(id) => school.id == *id,
            Self::Chain(id) => school.school_chain_id.as_deref() == Some(id.as_str()),
        };

        if inside {
            Ok(())
        } else {
            Err(AppError::TenantMismatch)
        }
    }

    /// Check that an owner pair (school XOR chain) matches this scope.
    ///
    /// Used for subscriptions, whose owner is stored as one of two
    /// columns.
    pub fn ensure_owner(
        &self,
        school_id: Option<&str>,
        school_chain_id: Option<&str>,
    ) -> AppResult<()> {
        let inside = match self {
            Self::School(id) => school_id == Some(id.as_str()),
            Self::Chain(id) => school_chain_id == Some(id.as_str()),
        };

        if inside {
            Ok(())
        } else {
            Err(AppError::TenantMismatch)
        }
    }
}
