//! Error types for escola.

use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Caller Errors ===
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unknown status '{value}' for {entity}")]
    UnknownStatus { entity: String, value: String },

    #[error("Action '{action}' is not allowed from state '{from}'")]
    InvalidSourceState { from: String, action: String },

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Actor is not authorized to perform this action")]
    UnauthorizedActor,

    #[error("Entity does not belong to the caller's tenant scope")]
    TenantMismatch,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // === Transient Errors ===
    #[error("Operation timed out: {0}")]
    Timeout(String),

    // === Server Errors ===
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the stable error code for boundary responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::UnknownStatus { .. } => "UNKNOWN_STATUS",
            Self::InvalidSourceState { .. } => "INVALID_SOURCE_STATE",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::UnauthorizedActor => "UNAUTHORIZED_ACTOR",
            Self::TenantMismatch => "TENANT_MISMATCH",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::Timeout(_) => "TIMEOUT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether a caller may safely retry the failed command.
    ///
    /// Only transient failures qualify; guard rejections are stable and
    /// retrying them yields the same outcome.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Conflict(_))
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Config(_) | Self::Internal(_)
        )
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        let err = AppError::UnknownStatus {
            entity: "consent".to_string(),
            value: "bogus".to_string(),
        };
        assert_eq!(err.error_code(), "UNKNOWN_STATUS");

        let err = AppError::InvalidSourceState {
            from: "denied".to_string(),
            action: "approve".to_string(),
        };
        assert_eq!(err.error_code(), "INVALID_SOURCE_STATE");

        assert_eq!(
            AppError::MissingField("feedback".to_string()).error_code(),
            "MISSING_FIELD"
        );
        assert_eq!(AppError::TenantMismatch.error_code(), "TENANT_MISMATCH");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(AppError::Conflict("version mismatch".to_string()).is_retryable());
        assert!(AppError::Timeout("pool acquire".to_string()).is_retryable());
        assert!(!AppError::UnauthorizedActor.is_retryable());
        assert!(
            !AppError::InvalidSourceState {
                from: "approved".to_string(),
                action: "deny".to_string(),
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_server_error_classification() {
        assert!(AppError::Database("connection refused".to_string()).is_server_error());
        assert!(!AppError::UnauthorizedActor.is_server_error());
        assert!(!AppError::Conflict("stale".to_string()).is_server_error());
    }
}
