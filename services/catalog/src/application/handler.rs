//! Business logic handler
//!
//! 按实体类型选择对应的 owner 适配器，再交给 [`ImageService`] 执行。

use catalog_errors::AppResult;
use sqlx::PgPool;
use tracing::info;

use super::commands::*;
use super::image_service::ImageService;
use super::owner_adapter::OwnerAdapter;
use crate::domain::entities::{Course, PhysicalGood, Seminar, TrainingSession};
use crate::domain::value_objects::OwnerKind;
use crate::infrastructure::persistence::PostgresCatalogRepository;

pub type PhysicalGoodOwners = OwnerAdapter<PostgresCatalogRepository<PhysicalGood>, PhysicalGood>;
pub type SeminarOwners = OwnerAdapter<PostgresCatalogRepository<Seminar>, Seminar>;
pub type CourseOwners = OwnerAdapter<PostgresCatalogRepository<Course>, Course>;
pub type TrainingSessionOwners =
    OwnerAdapter<PostgresCatalogRepository<TrainingSession>, TrainingSession>;

/// 按 owner 类型分派到对应适配器
macro_rules! with_owners {
    ($self:ident, $kind:expr, |$owners:ident| $body:expr) => {
        match $kind {
            OwnerKind::PhysicalGood => {
                let $owners = &$self.physical_goods;
                $body
            }
            OwnerKind::Seminar => {
                let $owners = &$self.seminars;
                $body
            }
            OwnerKind::Course => {
                let $owners = &$self.courses;
                $body
            }
            OwnerKind::TrainingSession => {
                let $owners = &$self.training_sessions;
                $body
            }
        }
    };
}

pub struct ServiceHandler {
    images: ImageService,
    physical_goods: PhysicalGoodOwners,
    seminars: SeminarOwners,
    courses: CourseOwners,
    training_sessions: TrainingSessionOwners,
}

impl ServiceHandler {
    pub fn new(pool: PgPool, images: ImageService) -> Self {
        Self {
            images,
            physical_goods: OwnerAdapter::new(PostgresCatalogRepository::new(pool.clone())),
            seminars: OwnerAdapter::new(PostgresCatalogRepository::new(pool.clone())),
            courses: OwnerAdapter::new(PostgresCatalogRepository::new(pool.clone())),
            training_sessions: OwnerAdapter::new(PostgresCatalogRepository::new(pool)),
        }
    }

    /// 挂载图片
    pub async fn add_image(&self, kind: OwnerKind, cmd: AddImageCommand) -> AppResult<()> {
        info!(kind = %kind, owner_id = %cmd.owner_id, "Adding image");
        with_owners!(self, kind, |owners| self.images.add_image(cmd, owners).await)?;
        Ok(())
    }

    /// 解除图片
    pub async fn delete_image(&self, kind: OwnerKind, cmd: DeleteImageCommand) -> AppResult<()> {
        info!(kind = %kind, owner_id = %cmd.owner_id, "Deleting image");
        with_owners!(self, kind, |owners| self.images.delete_image(cmd, owners).await)?;
        Ok(())
    }

    /// 批量挂载图片，返回新建关联的 owner 数
    pub async fn add_image_batch(
        &self,
        kind: OwnerKind,
        cmd: AddImageBatchCommand,
    ) -> AppResult<u64> {
        info!(kind = %kind, owners = cmd.owner_ids.len(), "Adding image to owners");
        let affected = with_owners!(self, kind, |owners| self
            .images
            .add_image_batch(cmd, owners)
            .await)?;
        Ok(affected)
    }

    /// 批量解除图片，返回计数被减一的 owner 数
    pub async fn delete_image_batch(
        &self,
        kind: OwnerKind,
        cmd: DeleteImageBatchCommand,
    ) -> AppResult<u64> {
        info!(kind = %kind, owners = cmd.owner_ids.len(), "Deleting image from owners");
        let affected = with_owners!(self, kind, |owners| self
            .images
            .delete_image_batch(cmd, owners)
            .await)?;
        Ok(affected)
    }
}
