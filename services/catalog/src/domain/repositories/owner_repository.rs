//! 多态 owner 仓储接口

use async_trait::async_trait;
use catalog_errors::AppError;
use catalog_ports::TransactionScope;
use thiserror::Error;

use crate::domain::entities::{NewImage, Owner};
use crate::domain::value_objects::{MediaServiceId, OwnerId, OwnerKind};

/// Owner 仓储错误
#[derive(Debug, Error)]
pub enum OwnerError {
    /// 传入的 owner 与仓储负责的实体类型不一致
    #[error("Incorrect owner type: expected {expected}, got {actual}")]
    IncorrectOwnerType {
        expected: OwnerKind,
        actual: OwnerKind,
    },

    #[error(transparent)]
    Storage(#[from] AppError),
}

pub type OwnerResult<T> = Result<T, OwnerError>;

/// 与实体类型无关的 owner 仓储
///
/// 图片服务只依赖此接口；每种目录实体通过各自的适配器实现它。
#[async_trait]
pub trait OwnerRepository: Send + Sync + Sized {
    type Scope: TransactionScope;

    /// 该仓储负责的实体类型
    fn kind(&self) -> OwnerKind;

    async fn begin(&self) -> OwnerResult<Self::Scope>;

    fn bind(&self, scope: &Self::Scope) -> Self;

    async fn get_including_unpublished(&self, id: &OwnerId) -> OwnerResult<Option<Owner>>;

    async fn list_including_unpublished_by_ids(&self, ids: &[OwnerId]) -> OwnerResult<Vec<Owner>>;

    /// 返回 true 表示新建了关联
    async fn add_image(&self, owner: &Owner, image: &NewImage) -> OwnerResult<bool>;

    /// 返回 true 表示删除了关联
    async fn delete_image(&self, owner: &Owner, media_service_id: &MediaServiceId)
        -> OwnerResult<bool>;

    /// 返回实际新建关联的 owner ID
    async fn add_image_batch(&self, owners: &[Owner], image: &NewImage)
        -> OwnerResult<Vec<OwnerId>>;

    async fn delete_image_batch(
        &self,
        owners: &[Owner],
        media_service_id: &MediaServiceId,
    ) -> OwnerResult<u64>;

    async fn batch_update(&self, owners: &[Owner], batch_size: usize) -> OwnerResult<u64>;

    async fn find_owner_ids_by_image_id(
        &self,
        media_service_id: &MediaServiceId,
        ids: &[OwnerId],
    ) -> OwnerResult<Vec<OwnerId>>;

    async fn decrement_image_count(&self, ids: &[OwnerId]) -> OwnerResult<u64>;
}
