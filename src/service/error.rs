use crate::client::ClientError;
use crate::repository::RepoError;
use thiserror::Error;

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Error taxonomy shared by the services, the orchestrator and the HTTP layer.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Integrity(String),
    #[error("{0}")]
    ServiceUnavailable(String),
    #[error("{0}")]
    BadResponse(String),
    #[error("{0}")]
    Provider(String),
    #[error("{0}")]
    Internal(String),
}

impl From<RepoError> for ServiceError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound { .. } => ServiceError::NotFound(err.to_string()),
            RepoError::Conflict(_) => ServiceError::Conflict(err.to_string()),
            RepoError::Invalid { .. } | RepoError::ForeignKey(_) | RepoError::Patch(_) => {
                ServiceError::Validation(err.to_string())
            }
            RepoError::Pool(_) | RepoError::PoolBuild(_) => {
                ServiceError::ServiceUnavailable(err.to_string())
            }
            RepoError::Database(_) | RepoError::Storage(_) => ServiceError::Internal(err.to_string()),
        }
    }
}

impl From<ClientError> for ServiceError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::ServiceUnavailable { .. } => {
                ServiceError::ServiceUnavailable(err.to_string())
            }
            ClientError::BadResponse(_) => ServiceError::BadResponse(err.to_string()),
            ClientError::Provider(_) | ClientError::Rejected { .. } => {
                ServiceError::Provider(err.to_string())
            }
            ClientError::Build(_) => ServiceError::Internal(err.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::Validation(err.to_string())
    }
}
