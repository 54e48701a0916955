//! Image commands

use std::collections::HashSet;

use thiserror::Error;
use url::Url;

use crate::domain::entities::NewImage;
use crate::domain::value_objects::{MediaServiceId, OwnerId};

/// 单次批量操作允许的最大 owner 数
pub const MAX_BATCH_OWNERS: usize = 100;

const MAX_IDENTIFIER_LEN: usize = 255;

/// 命令校验错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{field} is not a valid URL: {reason}")]
    InvalidUrl { field: &'static str, reason: String },

    #[error("{field} must use the {expected} scheme")]
    UnsupportedScheme {
        field: &'static str,
        expected: &'static str,
    },

    #[error("{field} must not be a nil id")]
    NilOwnerId { field: &'static str },

    #[error("owner_ids must contain between 1 and {max} ids")]
    OwnerCount { max: usize },

    #[error("owner_ids contains duplicate id {0}")]
    DuplicateOwnerId(OwnerId),
}

/// 为单个 owner 挂载图片
#[derive(Debug, Clone)]
pub struct AddImageCommand {
    pub url: String,
    pub secure_url: String,
    pub public_id: String,
    pub media_service_id: MediaServiceId,
    pub owner_id: OwnerId,
}

impl AddImageCommand {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_image(
            &self.url,
            &self.secure_url,
            &self.public_id,
            &self.media_service_id,
        )?;
        validate_owner_id("owner_id", &self.owner_id)
    }

    pub fn new_image(&self) -> NewImage {
        NewImage {
            url: self.url.clone(),
            secure_url: self.secure_url.clone(),
            public_id: self.public_id.clone(),
            media_service_id: self.media_service_id.clone(),
        }
    }
}

/// 从单个 owner 上解除图片
#[derive(Debug, Clone)]
pub struct DeleteImageCommand {
    pub media_service_id: MediaServiceId,
    pub owner_id: OwnerId,
}

impl DeleteImageCommand {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_identifier("media_service_id", self.media_service_id.as_str())?;
        validate_owner_id("owner_id", &self.owner_id)
    }
}

/// 为多个 owner 挂载同一张图片
#[derive(Debug, Clone)]
pub struct AddImageBatchCommand {
    pub url: String,
    pub secure_url: String,
    pub public_id: String,
    pub media_service_id: MediaServiceId,
    pub owner_ids: Vec<OwnerId>,
}

impl AddImageBatchCommand {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_image(
            &self.url,
            &self.secure_url,
            &self.public_id,
            &self.media_service_id,
        )?;
        validate_owner_ids(&self.owner_ids)
    }

    pub fn new_image(&self) -> NewImage {
        NewImage {
            url: self.url.clone(),
            secure_url: self.secure_url.clone(),
            public_id: self.public_id.clone(),
            media_service_id: self.media_service_id.clone(),
        }
    }
}

/// 从多个 owner 上解除同一张图片
#[derive(Debug, Clone)]
pub struct DeleteImageBatchCommand {
    pub media_service_id: MediaServiceId,
    pub owner_ids: Vec<OwnerId>,
}

impl DeleteImageBatchCommand {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_identifier("media_service_id", self.media_service_id.as_str())?;
        validate_owner_ids(&self.owner_ids)
    }
}

fn validate_image(
    url: &str,
    secure_url: &str,
    public_id: &str,
    media_service_id: &MediaServiceId,
) -> Result<(), ValidationError> {
    validate_url("url", url, &["http", "https"], "http(s)")?;
    validate_url("secure_url", secure_url, &["https"], "https")?;
    validate_identifier("public_id", public_id)?;
    validate_identifier("media_service_id", media_service_id.as_str())
}

fn validate_url(
    field: &'static str,
    value: &str,
    schemes: &[&str],
    expected: &'static str,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    let parsed = Url::parse(value).map_err(|e| ValidationError::InvalidUrl {
        field,
        reason: e.to_string(),
    })?;
    if !schemes.contains(&parsed.scheme()) {
        return Err(ValidationError::UnsupportedScheme { field, expected });
    }
    Ok(())
}

fn validate_identifier(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if value.chars().count() > MAX_IDENTIFIER_LEN {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_IDENTIFIER_LEN,
        });
    }
    Ok(())
}

fn validate_owner_id(field: &'static str, id: &OwnerId) -> Result<(), ValidationError> {
    if id.is_nil() {
        return Err(ValidationError::NilOwnerId { field });
    }
    Ok(())
}

fn validate_owner_ids(ids: &[OwnerId]) -> Result<(), ValidationError> {
    if ids.is_empty() || ids.len() > MAX_BATCH_OWNERS {
        return Err(ValidationError::OwnerCount {
            max: MAX_BATCH_OWNERS,
        });
    }
    let mut seen = HashSet::with_capacity(ids.len());
    for id in ids {
        validate_owner_id("owner_ids", id)?;
        if !seen.insert(*id) {
            return Err(ValidationError::DuplicateOwnerId(*id));
        }
    }
    Ok(())
}
