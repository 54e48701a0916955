//! 服务错误定义

use std::time::Duration;

use catalog_errors::AppError;
use thiserror::Error;

use crate::application::commands::ValidationError;
use crate::domain::repositories::OwnerError;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] ValidationError),

    #[error("Owner not found")]
    OwnerNotFound,

    #[error("None of the requested owners exist")]
    OwnersNotFound,

    #[error("Owner already holds the maximum number of images")]
    ImageLimitExceeded,

    #[error("Image is not attached to the owner")]
    ImageNotFoundOnOwner,

    #[error("Failed to look up owners of the image: {source}")]
    AssociationsNotFound {
        #[source]
        source: OwnerError,
    },

    #[error("Image is already attached to the owner")]
    ImageAlreadyAttached,

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Failed to {context}: {source}")]
    Internal {
        context: &'static str,
        #[source]
        source: OwnerError,
    },
}

impl ImageError {
    pub fn internal(context: &'static str, source: impl Into<OwnerError>) -> Self {
        Self::Internal {
            context,
            source: source.into(),
        }
    }
}

pub type ImageResult<T> = Result<T, ImageError>;

impl From<ValidationError> for AppError {
    fn from(error: ValidationError) -> Self {
        AppError::validation(error.to_string())
    }
}

impl From<ImageError> for AppError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::InvalidArgument(e) => e.into(),
            ImageError::OwnerNotFound => AppError::not_found("Owner not found"),
            ImageError::OwnersNotFound => AppError::not_found("None of the requested owners exist"),
            ImageError::ImageLimitExceeded => {
                AppError::failed_precondition("Owner already holds the maximum number of images")
            }
            ImageError::ImageNotFoundOnOwner => {
                AppError::not_found("Image is not attached to the owner")
            }
            ImageError::AssociationsNotFound { .. } => {
                AppError::not_found("Image associations not found")
            }
            ImageError::ImageAlreadyAttached => {
                AppError::conflict("Image is already attached to the owner")
            }
            e @ ImageError::Timeout(_) => AppError::deadline_exceeded(e.to_string()),
            e @ ImageError::Internal { .. } => AppError::internal(e.to_string()),
        }
    }
}
