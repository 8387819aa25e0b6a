//! Error kinds of the rights model

use hyper::StatusCode;

/// Result type for registry and authorization operations
pub type RbacResult<T> = Result<T, RbacError>;

/// Errors returned by registry, reload and admin operations.
///
/// None of these abort the process: the request path always gets a value
/// back and the last published snapshot stays in service.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RbacError {
    #[error("name '{0}' already exists")]
    DuplicateName(String),
    #[error("right '{0}' is not part of the right universe")]
    InvalidRight(String),
    #[error("role '{0}' does not exist")]
    UnknownRole(String),
    #[error("user '{0}' does not exist")]
    UnknownUser(String),
    #[error("user database could not be loaded: {0}")]
    LoadError(String),
    #[error("validation failed: {0}")]
    ValidationError(String),
    #[error("caller lacks right '{0}'")]
    Unauthorized(String),
}

impl RbacError {
    /// Stable snake_case code used in HTTP error bodies
    pub fn code(&self) -> &'static str {
        match self {
            RbacError::DuplicateName(_) => "duplicate_name",
            RbacError::InvalidRight(_) => "invalid_right",
            RbacError::UnknownRole(_) => "unknown_role",
            RbacError::UnknownUser(_) => "unknown_user",
            RbacError::LoadError(_) => "load_error",
            RbacError::ValidationError(_) => "validation_error",
            RbacError::Unauthorized(_) => "unauthorized",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            RbacError::DuplicateName(_) => StatusCode::CONFLICT,
            RbacError::InvalidRight(_) => StatusCode::BAD_REQUEST,
            RbacError::UnknownRole(_) | RbacError::UnknownUser(_) => StatusCode::NOT_FOUND,
            RbacError::LoadError(_) => StatusCode::SERVICE_UNAVAILABLE,
            RbacError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RbacError::Unauthorized(_) => StatusCode::FORBIDDEN,
        }
    }
}
