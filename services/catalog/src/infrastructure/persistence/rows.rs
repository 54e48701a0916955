//! 数据库行映射

use std::collections::HashMap;

use catalog_errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::{CatalogEntity, CatalogItem, Image};
use crate::domain::value_objects::{MediaServiceId, OwnerId, OwnerKind};

#[derive(sqlx::FromRow)]
pub(super) struct CatalogRow {
    pub id: Uuid,
    pub name: String,
    pub is_published: bool,
    pub uploaded_image_amount: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl CatalogRow {
    pub fn into_entity<E: CatalogEntity>(self, images: Vec<Image>) -> E {
        E::from_item(CatalogItem {
            id: OwnerId::from_uuid(self.id),
            name: self.name,
            is_published: self.is_published,
            uploaded_image_amount: self.uploaded_image_amount,
            images,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct ImageRow {
    pub id: Uuid,
    pub owner_kind: String,
    pub owner_id: Uuid,
    pub url: String,
    pub secure_url: String,
    pub public_id: String,
    pub media_service_id: String,
    pub created_at: DateTime<Utc>,
}

impl ImageRow {
    pub fn into_image(self) -> AppResult<Image> {
        let owner_kind: OwnerKind = self.owner_kind.parse().map_err(|e| {
            AppError::database(format!("Invalid owner kind in database for image {}: {}", self.id, e))
        })?;

        Ok(Image {
            id: self.id,
            owner_kind,
            owner_id: OwnerId::from_uuid(self.owner_id),
            url: self.url,
            secure_url: self.secure_url,
            public_id: self.public_id,
            media_service_id: MediaServiceId::new(self.media_service_id),
            created_at: self.created_at,
        })
    }
}

/// 按 owner 分组图片
pub(super) fn group_images(rows: Vec<ImageRow>) -> AppResult<HashMap<Uuid, Vec<Image>>> {
    let mut grouped: HashMap<Uuid, Vec<Image>> = HashMap::new();
    for row in rows {
        let owner_id = row.owner_id;
        grouped.entry(owner_id).or_default().push(row.into_image()?);
    }
    Ok(grouped)
}
