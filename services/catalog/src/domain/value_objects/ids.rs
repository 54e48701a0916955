//! 标识符

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 目录实体 ID（即图片 owner 的 ID）
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From,
)]
#[display("{_0}")]
pub struct OwnerId(pub Uuid);

impl OwnerId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

/// 外部媒体服务分配的图片 ID
///
/// 同一张图片可以挂在多个 owner 上，删除时以它为键。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{_0}")]
pub struct MediaServiceId(String);

impl MediaServiceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MediaServiceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}
