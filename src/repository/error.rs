use crate::models::entity::Entity;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::pooled_connection::deadpool::PoolError;
use thiserror::Error;
use validator::ValidationErrors;

pub type RepoResult<T> = std::result::Result<T, RepoError>;

#[derive(Error, Debug)]
pub enum RepoError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("{0}")]
    Conflict(String),
    #[error("invalid {entity}: {errors}")]
    Invalid {
        entity: &'static str,
        errors: ValidationErrors,
    },
    #[error("referenced row does not exist: {0}")]
    ForeignKey(String),
    #[error("could not get database connection from pool: {0}")]
    Pool(#[from] PoolError),
    #[error("could not build the connection pool: {0}")]
    PoolBuild(String),
    #[error("database error: {0}")]
    Database(DieselError),
    #[error("could not merge partial update: {0}")]
    Patch(#[from] serde_json::Error),
    #[error("storage error: {0}")]
    Storage(String),
}

impl RepoError {
    pub fn not_found<E: Entity>(id: &E::Id) -> Self {
        RepoError::NotFound {
            entity: E::NAME,
            id: id.to_string(),
        }
    }

    pub fn invalid<E: Entity>(errors: ValidationErrors) -> Self {
        RepoError::Invalid {
            entity: E::NAME,
            errors,
        }
    }

    pub fn duplicate<E: Entity>(id: &E::Id) -> Self {
        RepoError::Conflict(format!("{} with id {} already exists", E::NAME, id))
    }
}

impl From<DieselError> for RepoError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                RepoError::Conflict(info.message().to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                RepoError::ForeignKey(info.message().to_string())
            }
            other => RepoError::Database(other),
        }
    }
}
