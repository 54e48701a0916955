//! 目录实体
//!
//! 实物商品、研讨会、课程和培训场次共享同一组与图片相关的字段，
//! 差异只在类型本身，因此用宏生成四个强类型实体。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Image, Owner};
use crate::domain::value_objects::{OwnerId, OwnerKind};

/// 目录实体的公共数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: OwnerId,
    pub name: String,
    pub is_published: bool,
    /// 已上传图片数量，始终在 0..=MAX_UPLOADED_IMAGES 之间
    pub uploaded_image_amount: i32,
    pub images: Vec<Image>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl CatalogItem {
    /// 创建未发布、没有图片的实体数据
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: OwnerId::new(),
            name: name.into(),
            is_published: false,
            uploaded_image_amount: 0,
            images: Vec::new(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// 可以持有图片的目录实体
pub trait CatalogEntity: Clone + Send + Sync + 'static {
    const KIND: OwnerKind;

    fn from_item(item: CatalogItem) -> Self;

    fn item(&self) -> &CatalogItem;

    fn item_mut(&mut self) -> &mut CatalogItem;

    /// 包装为多态 owner
    fn into_owner(self) -> Owner;

    /// 从多态 owner 中取出本类型，类型不符时返回 None
    fn from_owner(owner: &Owner) -> Option<&Self>;

    fn id(&self) -> OwnerId {
        self.item().id
    }
}

macro_rules! define_catalog_entity {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name(CatalogItem);

        impl $name {
            pub fn new(name: impl Into<String>) -> Self {
                Self(CatalogItem::new(name))
            }
        }

        impl CatalogEntity for $name {
            const KIND: OwnerKind = OwnerKind::$name;

            fn from_item(item: CatalogItem) -> Self {
                Self(item)
            }

            fn item(&self) -> &CatalogItem {
                &self.0
            }

            fn item_mut(&mut self) -> &mut CatalogItem {
                &mut self.0
            }

            fn into_owner(self) -> Owner {
                Owner::$name(self)
            }

            fn from_owner(owner: &Owner) -> Option<&Self> {
                match owner {
                    Owner::$name(entity) => Some(entity),
                    _ => None,
                }
            }
        }

        impl From<$name> for Owner {
            fn from(entity: $name) -> Self {
                Owner::$name(entity)
            }
        }
    };
}

define_catalog_entity!(
    /// 实物商品
    PhysicalGood
);
define_catalog_entity!(
    /// 研讨会
    Seminar
);
define_catalog_entity!(
    /// 课程
    Course
);
define_catalog_entity!(
    /// 培训场次
    TrainingSession
);
