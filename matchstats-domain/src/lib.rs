use thiserror::Error;

pub mod audit;
pub mod fields;
pub mod service;
pub mod stats;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("invalid values for fields: {}", .0.join(", "))]
    InvalidFields(Vec<String>),

    #[error("name must not be empty")]
    EmptyName,

    #[error("malformed request body: {0}")]
    MalformedBody(String),
}

impl ValidationError {
    /// Names of the offending fields, empty when the error is not tied to specific fields.
    pub fn fields(&self) -> Vec<String> {
        match self {
            ValidationError::MissingFields(fields) | ValidationError::InvalidFields(fields) => {
                fields.clone()
            }
            ValidationError::EmptyName => vec!["name".to_string()],
            ValidationError::MalformedBody(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn not_found<T, R>(msg: T) -> ServiceResult<R>
    where
        T: Into<String>,
    {
        Err(ServiceError::NotFound(msg.into()))
    }

    pub fn internal<T, R>(msg: T) -> ServiceResult<R>
    where
        T: Into<String>,
    {
        Err(ServiceError::Internal(msg.into()))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
