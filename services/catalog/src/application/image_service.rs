//! 图片归属服务
//!
//! 对任意 [`OwnerRepository`] 执行挂载 / 解除图片，维护每个 owner 的图片计数。
//! 所有写操作都在一个事务中完成，任一步失败整体回滚。

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use catalog_config::ImagesConfig;
use catalog_ports::TransactionScope;
use tracing::{debug, info, warn};

use super::commands::{
    AddImageBatchCommand, AddImageCommand, DeleteImageBatchCommand, DeleteImageCommand,
};
use crate::domain::entities::Owner;
use crate::domain::repositories::{OwnerError, OwnerRepository};
use crate::domain::value_objects::OwnerId;
use crate::error::{ImageError, ImageResult};
use crate::infrastructure::observability::metrics;

/// 图片服务配置
#[derive(Debug, Clone)]
pub struct ImageServiceConfig {
    /// 批量回写 owner 记录时每批的行数
    pub batch_size: usize,
    /// 单次操作超时，超时后事务回滚
    pub operation_timeout: Option<Duration>,
}

impl Default for ImageServiceConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            operation_timeout: None,
        }
    }
}

impl From<&ImagesConfig> for ImageServiceConfig {
    fn from(config: &ImagesConfig) -> Self {
        Self {
            batch_size: config.batch_size.max(1),
            operation_timeout: config.operation_timeout_ms.map(Duration::from_millis),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImageService {
    config: ImageServiceConfig,
}

impl ImageService {
    pub fn new(config: ImageServiceConfig) -> Self {
        Self { config }
    }

    /// 为单个 owner 挂载图片
    pub async fn add_image<R: OwnerRepository>(
        &self,
        cmd: AddImageCommand,
        repo: &R,
    ) -> ImageResult<()> {
        // 1. 验证命令
        cmd.validate()?;

        let kind = repo.kind();
        let owner_id = cmd.owner_id;
        let image = cmd.new_image();
        let batch_size = self.config.batch_size;
        let timer = metrics::OperationTimer::new(kind, "add_image");

        let result = self
            .with_deadline(in_transaction(repo, |tx| async move {
                // 2. 锁定 owner
                let mut owner = tx
                    .get_including_unpublished(&owner_id)
                    .await
                    .map_err(|e| ImageError::internal("fetch owner", e))?
                    .ok_or(ImageError::OwnerNotFound)?;

                // 3. 检查上限与重复
                if !owner.increment_uploaded_image_amount() {
                    return Err(ImageError::ImageLimitExceeded);
                }
                if owner.has_image(&image.media_service_id) {
                    return Err(ImageError::ImageAlreadyAttached);
                }

                // 4. 写入关联并回写计数
                let created = tx
                    .add_image(&owner, &image)
                    .await
                    .map_err(|e| ImageError::internal("attach image", e))?;
                if !created {
                    return Err(ImageError::ImageAlreadyAttached);
                }
                tx.batch_update(std::slice::from_ref(&owner), batch_size)
                    .await
                    .map_err(|e| ImageError::internal("persist image counter", e))?;

                Ok(owner.uploaded_image_amount())
            }))
            .await;

        timer.finish(result.is_ok());
        match &result {
            Ok(amount) => {
                metrics::record_images_attached(kind, 1);
                info!(kind = %kind, owner_id = %owner_id, uploaded_image_amount = amount, "Image attached");
            }
            Err(ImageError::ImageLimitExceeded) => {
                metrics::record_image_limit_rejections(kind, 1);
                warn!(kind = %kind, owner_id = %owner_id, "Image limit reached");
            }
            Err(e) => warn!(kind = %kind, owner_id = %owner_id, error = %e, "Failed to attach image"),
        }
        result.map(|_| ())
    }

    /// 从单个 owner 上解除图片
    pub async fn delete_image<R: OwnerRepository>(
        &self,
        cmd: DeleteImageCommand,
        repo: &R,
    ) -> ImageResult<()> {
        cmd.validate()?;

        let kind = repo.kind();
        let DeleteImageCommand {
            media_service_id,
            owner_id,
        } = cmd;
        let timer = metrics::OperationTimer::new(kind, "delete_image");

        let result = self
            .with_deadline(in_transaction(repo, |tx| async move {
                let mut owner = tx
                    .get_including_unpublished(&owner_id)
                    .await
                    .map_err(|e| ImageError::internal("fetch owner", e))?
                    .ok_or(ImageError::OwnerNotFound)?;

                let removed = tx
                    .delete_image(&owner, &media_service_id)
                    .await
                    .map_err(|e| ImageError::internal("detach image", e))?;
                if !removed {
                    return Err(ImageError::ImageNotFoundOnOwner);
                }

                tx.decrement_image_count(&[owner.id()])
                    .await
                    .map_err(|e| ImageError::internal("decrement image counter", e))?;
                owner.decrement_uploaded_image_amount();

                Ok(owner.uploaded_image_amount())
            }))
            .await;

        timer.finish(result.is_ok());
        match &result {
            Ok(amount) => {
                metrics::record_images_detached(kind, 1);
                info!(kind = %kind, owner_id = %owner_id, uploaded_image_amount = amount, "Image detached");
            }
            Err(e) => warn!(kind = %kind, owner_id = %owner_id, error = %e, "Failed to detach image"),
        }
        result.map(|_| ())
    }

    /// 为多个 owner 挂载同一张图片
    ///
    /// 已达上限的 owner 被跳过，只有实际新建关联的 owner 计数加一。
    /// 返回新建关联的 owner 数；所有 owner 都已达上限时返回 0。
    pub async fn add_image_batch<R: OwnerRepository>(
        &self,
        cmd: AddImageBatchCommand,
        repo: &R,
    ) -> ImageResult<u64> {
        cmd.validate()?;

        let kind = repo.kind();
        let image = cmd.new_image();
        let batch_size = self.config.batch_size;
        metrics::record_batch_owners(kind, "add_image_batch", cmd.owner_ids.len());
        let timer = metrics::OperationTimer::new(kind, "add_image_batch");

        let result = self
            .with_deadline(async {
                // 1. 事务外预筛选
                let owners = repo
                    .list_including_unpublished_by_ids(&cmd.owner_ids)
                    .await
                    .map_err(|e| ImageError::internal("fetch owners", e))?;
                if owners.is_empty() {
                    return Err(ImageError::OwnersNotFound);
                }

                let candidates: Vec<OwnerId> = owners
                    .iter()
                    .filter(|owner| owner.can_accept_image())
                    .map(Owner::id)
                    .collect();
                let at_limit = owners.len() - candidates.len();
                if at_limit > 0 {
                    metrics::record_image_limit_rejections(kind, at_limit as u64);
                    debug!(kind = %kind, skipped = at_limit, "Skipping owners at the image limit");
                }
                if candidates.is_empty() {
                    return Ok(0);
                }

                // 2. 事务内重新读取，跳过期间已达上限的 owner
                in_transaction(repo, |tx| async move {
                    let mut owners: Vec<Owner> = tx
                        .list_including_unpublished_by_ids(&candidates)
                        .await
                        .map_err(|e| ImageError::internal("fetch owners", e))?
                        .into_iter()
                        .filter(Owner::can_accept_image)
                        .collect();
                    if owners.is_empty() {
                        return Ok(0);
                    }

                    let attached: HashSet<OwnerId> = tx
                        .add_image_batch(&owners, &image)
                        .await
                        .map_err(|e| ImageError::internal("attach image batch", e))?
                        .into_iter()
                        .collect();

                    owners.retain_mut(|owner| {
                        attached.contains(&owner.id()) && owner.increment_uploaded_image_amount()
                    });
                    if !owners.is_empty() {
                        tx.batch_update(&owners, batch_size)
                            .await
                            .map_err(|e| ImageError::internal("persist image counters", e))?;
                    }

                    Ok::<_, ImageError>(owners.len() as u64)
                })
                .await
            })
            .await;

        timer.finish(result.is_ok());
        match &result {
            Ok(affected) => {
                metrics::record_images_attached(kind, *affected);
                info!(
                    kind = %kind,
                    requested = cmd.owner_ids.len(),
                    affected = affected,
                    "Image attached to owners"
                );
            }
            Err(e) => warn!(kind = %kind, error = %e, "Failed to attach image to owners"),
        }
        result
    }

    /// 从多个 owner 上解除同一张图片
    ///
    /// 返回实际持有该图片、计数被减一的 owner 数。
    /// 关联查询成功但没有任何 owner 持有该图片时返回 0；
    /// 关联查询本身失败时返回 [`ImageError::AssociationsNotFound`]。
    pub async fn delete_image_batch<R: OwnerRepository>(
        &self,
        cmd: DeleteImageBatchCommand,
        repo: &R,
    ) -> ImageResult<u64> {
        cmd.validate()?;

        let kind = repo.kind();
        let requested = cmd.owner_ids.len();
        let DeleteImageBatchCommand {
            media_service_id,
            owner_ids,
        } = cmd;
        metrics::record_batch_owners(kind, "delete_image_batch", requested);
        let timer = metrics::OperationTimer::new(kind, "delete_image_batch");

        let result = self
            .with_deadline(in_transaction(repo, |tx| async move {
                let owners = tx
                    .list_including_unpublished_by_ids(&owner_ids)
                    .await
                    .map_err(|e| ImageError::internal("fetch owners", e))?;
                if owners.is_empty() {
                    return Err(ImageError::OwnersNotFound);
                }

                let existing: Vec<OwnerId> = owners.iter().map(Owner::id).collect();
                let affected = tx
                    .find_owner_ids_by_image_id(&media_service_id, &existing)
                    .await
                    .map_err(|source| ImageError::AssociationsNotFound { source })?;

                tx.delete_image_batch(&owners, &media_service_id)
                    .await
                    .map_err(|e| ImageError::internal("detach image batch", e))?;
                if !affected.is_empty() {
                    tx.decrement_image_count(&affected)
                        .await
                        .map_err(|e| ImageError::internal("decrement image counters", e))?;
                }

                Ok(affected.len() as u64)
            }))
            .await;

        timer.finish(result.is_ok());
        match &result {
            Ok(affected) => {
                metrics::record_images_detached(kind, *affected);
                info!(kind = %kind, requested = requested, affected = affected, "Image detached from owners");
            }
            Err(e) => warn!(kind = %kind, error = %e, "Failed to detach image from owners"),
        }
        result
    }

    async fn with_deadline<T>(&self, fut: impl Future<Output = ImageResult<T>>) -> ImageResult<T> {
        match self.config.operation_timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| ImageError::Timeout(limit))?,
            None => fut.await,
        }
    }
}

/// 在事务中执行 `work`：成功提交，失败回滚
///
/// 超时导致 future 被丢弃时，作用域随之丢弃，事务同样回滚。
async fn in_transaction<R, T, F, Fut>(repo: &R, work: F) -> ImageResult<T>
where
    R: OwnerRepository,
    F: FnOnce(R) -> Fut,
    Fut: Future<Output = ImageResult<T>>,
{
    let scope = repo
        .begin()
        .await
        .map_err(|e| ImageError::internal("begin transaction", e))?;

    match work(repo.bind(&scope)).await {
        Ok(value) => {
            scope
                .commit()
                .await
                .map_err(|e| ImageError::internal("commit transaction", OwnerError::Storage(e)))?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = scope.rollback().await {
                warn!(error = %rollback_err, "Failed to rollback transaction");
            }
            Err(err)
        }
    }
}
