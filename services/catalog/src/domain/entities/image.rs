//! 图片

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::{MediaServiceId, OwnerId, OwnerKind};

/// 待挂载的图片描述
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewImage {
    pub url: String,
    pub secure_url: String,
    pub public_id: String,
    pub media_service_id: MediaServiceId,
}

/// 已挂载到某个 owner 上的图片
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub id: Uuid,
    pub owner_kind: OwnerKind,
    pub owner_id: OwnerId,
    pub url: String,
    pub secure_url: String,
    pub public_id: String,
    pub media_service_id: MediaServiceId,
    pub created_at: DateTime<Utc>,
}

impl Image {
    /// 把图片挂载到指定 owner 上
    pub fn attach(image: &NewImage, owner_kind: OwnerKind, owner_id: OwnerId) -> Self {
        Self {
            id: Uuid::now_v7(),
            owner_kind,
            owner_id,
            url: image.url.clone(),
            secure_url: image.secure_url.clone(),
            public_id: image.public_id.clone(),
            media_service_id: image.media_service_id.clone(),
            created_at: Utc::now(),
        }
    }
}
