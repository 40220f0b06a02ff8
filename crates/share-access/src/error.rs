//! Error types for sharing operations
//!
//! A user having no access is not an error: the evaluator answers with
//! [`AccessDecision::None`](crate::AccessDecision::None). Errors come from
//! store mutations, owner-only checks, and boundary parsing.

use thiserror::Error;
use uuid::Uuid;

/// Sharing error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ShareError {
    /// Resource (or another required record) does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The user is already a member of the resource
    #[error("User {user_id} is already a member of resource {resource_id}")]
    AlreadyMember {
        /// Resource ID
        resource_id: Uuid,
        /// User ID
        user_id: Uuid,
    },

    /// The user has no membership in the resource
    #[error("User {user_id} is not a member of resource {resource_id}")]
    NotMember {
        /// Resource ID
        resource_id: Uuid,
        /// User ID
        user_id: Uuid,
    },

    /// Acting user is not allowed to perform the operation
    #[error("Forbidden: insufficient permissions")]
    Forbidden,

    /// Policy value outside `all | readonly | custom`
    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    /// Level value outside `read | write`
    #[error("Invalid level: {0}")]
    InvalidLevel(String),

    /// Backing store failure
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for sharing operations.
pub type ShareResult<T> = Result<T, ShareError>;

impl ShareError {
    /// Shorthand for a missing resource.
    pub fn resource_not_found(resource_id: Uuid) -> Self {
        ShareError::NotFound(format!("resource {}", resource_id))
    }

    /// Check if this error should be logged at error level.
    ///
    /// Missing records and denied access are expected outcomes.
    pub fn is_server_error(&self) -> bool {
        matches!(self, ShareError::Storage(_))
    }

    /// Check if the error is one of the "not found" family.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ShareError::NotFound(_) | ShareError::NotMember { .. })
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ShareError::NotFound(_) | ShareError::NotMember { .. } => 404,
            ShareError::AlreadyMember { .. } => 409,
            ShareError::Forbidden => 403,
            ShareError::InvalidPolicy(_) | ShareError::InvalidLevel(_) => 422,
            ShareError::Storage(_) => 500,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            ShareError::NotFound(_) => "NOT_FOUND",
            ShareError::AlreadyMember { .. } => "ALREADY_MEMBER",
            ShareError::NotMember { .. } => "NOT_MEMBER",
            ShareError::Forbidden => "FORBIDDEN",
            ShareError::InvalidPolicy(_) => "INVALID_POLICY",
            ShareError::InvalidLevel(_) => "INVALID_LEVEL",
            ShareError::Storage(_) => "STORAGE_ERROR",
        }
    }
}
