//! 多态图片 owner

use serde::{Deserialize, Serialize};

use super::{CatalogEntity, CatalogItem, Course, Image, PhysicalGood, Seminar, TrainingSession};
use crate::domain::value_objects::{MediaServiceId, OwnerId, OwnerKind};

/// 每个 owner 最多持有的图片数量
pub const MAX_UPLOADED_IMAGES: i32 = 5;

/// 图片 owner：四种目录实体之一
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "entity", rename_all = "snake_case")]
pub enum Owner {
    PhysicalGood(PhysicalGood),
    Seminar(Seminar),
    Course(Course),
    TrainingSession(TrainingSession),
}

impl Owner {
    pub fn kind(&self) -> OwnerKind {
        match self {
            Owner::PhysicalGood(_) => OwnerKind::PhysicalGood,
            Owner::Seminar(_) => OwnerKind::Seminar,
            Owner::Course(_) => OwnerKind::Course,
            Owner::TrainingSession(_) => OwnerKind::TrainingSession,
        }
    }

    fn item(&self) -> &CatalogItem {
        match self {
            Owner::PhysicalGood(e) => e.item(),
            Owner::Seminar(e) => e.item(),
            Owner::Course(e) => e.item(),
            Owner::TrainingSession(e) => e.item(),
        }
    }

    fn item_mut(&mut self) -> &mut CatalogItem {
        match self {
            Owner::PhysicalGood(e) => e.item_mut(),
            Owner::Seminar(e) => e.item_mut(),
            Owner::Course(e) => e.item_mut(),
            Owner::TrainingSession(e) => e.item_mut(),
        }
    }

    pub fn id(&self) -> OwnerId {
        self.item().id
    }

    pub fn uploaded_image_amount(&self) -> i32 {
        self.item().uploaded_image_amount
    }

    pub fn images(&self) -> &[Image] {
        &self.item().images
    }

    /// 是否已挂载该媒体图片
    pub fn has_image(&self, media_service_id: &MediaServiceId) -> bool {
        self.images()
            .iter()
            .any(|image| &image.media_service_id == media_service_id)
    }

    /// 是否还能再挂载一张图片
    pub fn can_accept_image(&self) -> bool {
        self.uploaded_image_amount() < MAX_UPLOADED_IMAGES
    }

    /// 图片计数加一；已达上限时不修改并返回 false
    pub fn increment_uploaded_image_amount(&mut self) -> bool {
        if !self.can_accept_image() {
            return false;
        }
        self.item_mut().uploaded_image_amount += 1;
        true
    }

    /// 图片计数减一，不会低于零
    pub fn decrement_uploaded_image_amount(&mut self) {
        let item = self.item_mut();
        item.uploaded_image_amount = (item.uploaded_image_amount - 1).max(0);
    }
}
