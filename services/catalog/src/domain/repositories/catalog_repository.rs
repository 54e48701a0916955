//! 目录实体仓储接口

use async_trait::async_trait;
use catalog_errors::AppResult;
use catalog_ports::TransactionScope;

use crate::domain::entities::{CatalogEntity, NewImage};
use crate::domain::value_objects::{MediaServiceId, OwnerId};

/// 按实体类型划分的仓储
///
/// 所有查询都排除软删除的实体，但包含未发布的实体。
#[async_trait]
pub trait CatalogRepository<E: CatalogEntity>: Send + Sync + Sized {
    type Scope: TransactionScope;

    /// 开始一个事务
    async fn begin(&self) -> AppResult<Self::Scope>;

    /// 返回绑定到事务作用域的仓储，后续调用都在该事务中执行
    fn bind(&self, scope: &Self::Scope) -> Self;

    /// 按 ID 查找实体（事务中会锁定该行）
    async fn find_including_unpublished(&self, id: &OwnerId) -> AppResult<Option<E>>;

    /// 按 ID 列表查找实体，不存在的 ID 被忽略
    async fn list_including_unpublished_by_ids(&self, ids: &[OwnerId]) -> AppResult<Vec<E>>;

    /// 挂载图片；已挂载同一媒体图片时返回 false
    async fn add_image(&self, entity: &E, image: &NewImage) -> AppResult<bool>;

    /// 解除图片关联；没有关联时返回 false
    async fn delete_image(&self, entity: &E, media_service_id: &MediaServiceId)
        -> AppResult<bool>;

    /// 为多个实体挂载同一张图片，返回实际新建关联的实体 ID
    async fn add_image_batch(&self, entities: &[&E], image: &NewImage) -> AppResult<Vec<OwnerId>>;

    /// 从多个实体上解除同一张图片，返回删除的关联数
    async fn delete_image_batch(
        &self,
        entities: &[&E],
        media_service_id: &MediaServiceId,
    ) -> AppResult<u64>;

    /// 按批回写实体的图片计数
    async fn batch_update(&self, entities: &[&E], batch_size: usize) -> AppResult<u64>;

    /// 在给定 ID 中找出挂载了该图片的实体
    async fn find_owner_ids_by_image_id(
        &self,
        media_service_id: &MediaServiceId,
        ids: &[OwnerId],
    ) -> AppResult<Vec<OwnerId>>;

    /// 图片计数减一（不低于零），返回更新的行数
    async fn decrement_image_count(&self, ids: &[OwnerId]) -> AppResult<u64>;
}
