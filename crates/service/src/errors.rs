use thiserror::Error;

use models::errors::ModelError;

use crate::storage::StoreError;

/// Business errors for listing workflows.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("authentication required")]
    Unauthenticated,
    #[error(transparent)]
    Validation(#[from] ModelError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    pub fn forbidden(entity: &str) -> Self { Self::Forbidden(format!("caller does not own this {}", entity)) }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            ServiceError::Unauthenticated => 2001,
            ServiceError::Validation(_) => 2002,
            ServiceError::NotFound(_) => 2003,
            ServiceError::Forbidden(_) => 2004,
            ServiceError::Storage(_) => 2200,
        }
    }
}
