use service_core::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Client not found: {0}")]
    ClientNotFound(String),

    #[error("Duplicate {field}")]
    Duplicate { field: &'static str },

    #[error("Token references unknown client {0}")]
    UnknownClient(String),
}

impl From<mongodb::bson::ser::Error> for StoreError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Client not found: {0}")]
    ClientNotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ClientNotFound(id) | StoreError::UnknownClient(id) => {
                AppError::NotFound(anyhow::anyhow!("Client not found: {}", id))
            }
            StoreError::Duplicate { field } => {
                AppError::Conflict(anyhow::anyhow!("A client with this {} already exists", field))
            }
            StoreError::Database(e) => AppError::DatabaseError(anyhow::Error::new(e)),
            StoreError::Serialization(e) => AppError::InternalError(anyhow::anyhow!(e)),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(e) => AppError::ValidationError(e),
            ServiceError::ClientNotFound(id) => {
                AppError::NotFound(anyhow::anyhow!("Client not found: {}", id))
            }
            ServiceError::Store(e) => e.into(),
        }
    }
}
