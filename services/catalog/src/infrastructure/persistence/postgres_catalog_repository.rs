//! PostgreSQL 目录实体仓储
//!
//! 四种实体共用一份实现，表名由实体类型决定；图片关联统一存放在
//! `catalog_images` 表，以 `owner_kind` + `owner_id` 区分。

use std::collections::HashMap;
use std::marker::PhantomData;

use async_trait::async_trait;
use catalog_adapter_postgres::{PgExecutor, PgTransactionScope};
use catalog_errors::{AppError, AppResult};
use sqlx::{PgConnection, PgPool};
use tracing::debug;
use uuid::Uuid;

use super::rows::{group_images, CatalogRow, ImageRow};
use crate::domain::entities::{CatalogEntity, Image, NewImage};
use crate::domain::repositories::CatalogRepository;
use crate::domain::value_objects::{MediaServiceId, OwnerId};

const CATALOG_COLUMNS: &str =
    "id, name, is_published, uploaded_image_amount, created_at, updated_at, deleted_at";

pub struct PostgresCatalogRepository<E> {
    pool: PgPool,
    db: PgExecutor,
    _entity: PhantomData<fn() -> E>,
}

impl<E: CatalogEntity> PostgresCatalogRepository<E> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            db: PgExecutor::Pool(pool.clone()),
            pool,
            _entity: PhantomData,
        }
    }

    fn table() -> &'static str {
        E::KIND.table_name()
    }

    /// 事务中读取实体时加行锁
    fn lock_clause(&self) -> &'static str {
        if self.db.in_transaction() {
            " FOR UPDATE"
        } else {
            ""
        }
    }

    async fn load_images(
        conn: &mut PgConnection,
        owner_ids: &[Uuid],
    ) -> AppResult<HashMap<Uuid, Vec<Image>>> {
        let rows = sqlx::query_as::<_, ImageRow>(
            r#"
            SELECT id, owner_kind, owner_id, url, secure_url, public_id, media_service_id, created_at
            FROM catalog_images
            WHERE owner_kind = $1 AND owner_id = ANY($2)
            ORDER BY created_at, id
            "#,
        )
        .bind(E::KIND.as_str())
        .bind(owner_ids)
        .fetch_all(conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to load images: {}", e)))?;

        group_images(rows)
    }
}

impl<E> Clone for PostgresCatalogRepository<E> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            db: self.db.clone(),
            _entity: PhantomData,
        }
    }
}

fn uuids(ids: &[OwnerId]) -> Vec<Uuid> {
    ids.iter().map(|id| id.0).collect()
}

fn entity_uuids<E: CatalogEntity>(entities: &[&E]) -> Vec<Uuid> {
    entities.iter().map(|entity| entity.id().0).collect()
}

#[async_trait]
impl<E: CatalogEntity> CatalogRepository<E> for PostgresCatalogRepository<E> {
    type Scope = PgTransactionScope;

    async fn begin(&self) -> AppResult<Self::Scope> {
        if self.db.in_transaction() {
            return Err(AppError::internal(
                "Repository is already bound to a transaction",
            ));
        }
        PgTransactionScope::begin(&self.pool).await
    }

    fn bind(&self, scope: &Self::Scope) -> Self {
        Self {
            pool: self.pool.clone(),
            db: scope.executor(),
            _entity: PhantomData,
        }
    }

    async fn find_including_unpublished(&self, id: &OwnerId) -> AppResult<Option<E>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1 AND deleted_at IS NULL{}",
            CATALOG_COLUMNS,
            Self::table(),
            self.lock_clause()
        );

        let mut conn = self.db.acquire().await?;
        let row = sqlx::query_as::<_, CatalogRow>(&sql)
            .bind(id.0)
            .fetch_optional(conn.executor()?)
            .await
            .map_err(|e| AppError::database(format!("Failed to find {}: {}", E::KIND, e)))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut images = Self::load_images(conn.executor()?, &[row.id]).await?;
        let images = images.remove(&row.id).unwrap_or_default();
        Ok(Some(row.into_entity(images)))
    }

    async fn list_including_unpublished_by_ids(&self, ids: &[OwnerId]) -> AppResult<Vec<E>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {} FROM {} WHERE id = ANY($1) AND deleted_at IS NULL ORDER BY id{}",
            CATALOG_COLUMNS,
            Self::table(),
            self.lock_clause()
        );

        let mut conn = self.db.acquire().await?;
        let rows = sqlx::query_as::<_, CatalogRow>(&sql)
            .bind(uuids(ids))
            .fetch_all(conn.executor()?)
            .await
            .map_err(|e| AppError::database(format!("Failed to list {}: {}", E::KIND, e)))?;

        let found: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let mut images = Self::load_images(conn.executor()?, &found).await?;

        debug!(kind = %E::KIND, requested = ids.len(), found = rows.len(), "Owners loaded");
        Ok(rows
            .into_iter()
            .map(|row| {
                let owned = images.remove(&row.id).unwrap_or_default();
                row.into_entity(owned)
            })
            .collect())
    }

    async fn add_image(&self, entity: &E, image: &NewImage) -> AppResult<bool> {
        let attached = Image::attach(image, E::KIND, entity.id());

        let mut conn = self.db.acquire().await?;
        let result = sqlx::query(
            r#"
            INSERT INTO catalog_images
                (id, owner_kind, owner_id, url, secure_url, public_id, media_service_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (owner_kind, owner_id, media_service_id) DO NOTHING
            "#,
        )
        .bind(attached.id)
        .bind(E::KIND.as_str())
        .bind(attached.owner_id.0)
        .bind(&attached.url)
        .bind(&attached.secure_url)
        .bind(&attached.public_id)
        .bind(attached.media_service_id.as_str())
        .bind(attached.created_at)
        .execute(conn.executor()?)
        .await
        .map_err(|e| AppError::database(format!("Failed to insert image: {}", e)))?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_image(
        &self,
        entity: &E,
        media_service_id: &MediaServiceId,
    ) -> AppResult<bool> {
        let mut conn = self.db.acquire().await?;
        let result = sqlx::query(
            r#"
            DELETE FROM catalog_images
            WHERE owner_kind = $1 AND owner_id = $2 AND media_service_id = $3
            "#,
        )
        .bind(E::KIND.as_str())
        .bind(entity.id().0)
        .bind(media_service_id.as_str())
        .execute(conn.executor()?)
        .await
        .map_err(|e| AppError::database(format!("Failed to delete image: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_image_batch(&self, entities: &[&E], image: &NewImage) -> AppResult<Vec<OwnerId>> {
        if entities.is_empty() {
            return Ok(Vec::new());
        }

        let owner_ids = entity_uuids(entities);
        let image_ids: Vec<Uuid> = owner_ids.iter().map(|_| Uuid::now_v7()).collect();

        let mut conn = self.db.acquire().await?;
        let inserted = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO catalog_images
                (id, owner_kind, owner_id, url, secure_url, public_id, media_service_id, created_at)
            SELECT u.id, $1, u.owner_id, $2, $3, $4, $5, NOW()
            FROM UNNEST($6::uuid[], $7::uuid[]) AS u(id, owner_id)
            ON CONFLICT (owner_kind, owner_id, media_service_id) DO NOTHING
            RETURNING owner_id
            "#,
        )
        .bind(E::KIND.as_str())
        .bind(&image.url)
        .bind(&image.secure_url)
        .bind(&image.public_id)
        .bind(image.media_service_id.as_str())
        .bind(image_ids)
        .bind(owner_ids)
        .fetch_all(conn.executor()?)
        .await
        .map_err(|e| AppError::database(format!("Failed to insert images: {}", e)))?;

        Ok(inserted.into_iter().map(OwnerId::from_uuid).collect())
    }

    async fn delete_image_batch(
        &self,
        entities: &[&E],
        media_service_id: &MediaServiceId,
    ) -> AppResult<u64> {
        if entities.is_empty() {
            return Ok(0);
        }

        let mut conn = self.db.acquire().await?;
        let result = sqlx::query(
            r#"
            DELETE FROM catalog_images
            WHERE owner_kind = $1 AND media_service_id = $2 AND owner_id = ANY($3)
            "#,
        )
        .bind(E::KIND.as_str())
        .bind(media_service_id.as_str())
        .bind(entity_uuids(entities))
        .execute(conn.executor()?)
        .await
        .map_err(|e| AppError::database(format!("Failed to delete images: {}", e)))?;

        Ok(result.rows_affected())
    }

    async fn batch_update(&self, entities: &[&E], batch_size: usize) -> AppResult<u64> {
        let sql = format!(
            r#"
            UPDATE {} AS t
            SET uploaded_image_amount = u.amount, updated_at = NOW()
            FROM UNNEST($1::uuid[], $2::int4[]) AS u(id, amount)
            WHERE t.id = u.id AND t.deleted_at IS NULL
            "#,
            Self::table()
        );

        let mut conn = self.db.acquire().await?;
        let mut updated = 0;
        for chunk in entities.chunks(batch_size.max(1)) {
            let ids = entity_uuids(chunk);
            let amounts: Vec<i32> = chunk
                .iter()
                .map(|entity| entity.item().uploaded_image_amount)
                .collect();

            let result = sqlx::query(&sql)
                .bind(ids)
                .bind(amounts)
                .execute(conn.executor()?)
                .await
                .map_err(|e| AppError::database(format!("Failed to update {}: {}", E::KIND, e)))?;
            updated += result.rows_affected();
        }

        Ok(updated)
    }

    async fn find_owner_ids_by_image_id(
        &self,
        media_service_id: &MediaServiceId,
        ids: &[OwnerId],
    ) -> AppResult<Vec<OwnerId>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.db.acquire().await?;
        let owner_ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT DISTINCT owner_id
            FROM catalog_images
            WHERE owner_kind = $1 AND media_service_id = $2 AND owner_id = ANY($3)
            "#,
        )
        .bind(E::KIND.as_str())
        .bind(media_service_id.as_str())
        .bind(uuids(ids))
        .fetch_all(conn.executor()?)
        .await
        .map_err(|e| AppError::database(format!("Failed to find image owners: {}", e)))?;

        Ok(owner_ids.into_iter().map(OwnerId::from_uuid).collect())
    }

    async fn decrement_image_count(&self, ids: &[OwnerId]) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            r#"
            UPDATE {}
            SET uploaded_image_amount = GREATEST(uploaded_image_amount - 1, 0), updated_at = NOW()
            WHERE id = ANY($1) AND deleted_at IS NULL
            "#,
            Self::table()
        );

        let mut conn = self.db.acquire().await?;
        let result = sqlx::query(&sql)
            .bind(uuids(ids))
            .execute(conn.executor()?)
            .await
            .map_err(|e| {
                AppError::database(format!("Failed to decrement image count: {}", e))
            })?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Owner, Seminar};
    use catalog_ports::TransactionScope;

    async fn insert_seminar(pool: &PgPool, amount: i32, deleted: bool) -> OwnerId {
        let id = OwnerId::new();
        sqlx::query(
            r#"
            INSERT INTO seminars (id, name, is_published, uploaded_image_amount, deleted_at)
            VALUES ($1, $2, FALSE, $3, CASE WHEN $4 THEN NOW() ELSE NULL END)
            "#,
        )
        .bind(id.0)
        .bind("Ops night")
        .bind(amount)
        .bind(deleted)
        .execute(pool)
        .await
        .unwrap();
        id
    }

    fn image(media_service_id: &str) -> NewImage {
        NewImage {
            url: format!("http://media.example.com/{}.jpg", media_service_id),
            secure_url: format!("https://media.example.com/{}.jpg", media_service_id),
            public_id: format!("catalog/{}", media_service_id),
            media_service_id: MediaServiceId::new(media_service_id),
        }
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    #[ignore] // 需要 PostgreSQL 实例
    async fn test_find_skips_soft_deleted(pool: PgPool) {
        let repo = PostgresCatalogRepository::<Seminar>::new(pool.clone());
        let live = insert_seminar(&pool, 0, false).await;
        let deleted = insert_seminar(&pool, 0, true).await;

        let found = repo.find_including_unpublished(&live).await.unwrap().unwrap();
        assert!(!found.item().is_published);
        assert!(repo.find_including_unpublished(&deleted).await.unwrap().is_none());

        let listed = repo
            .list_including_unpublished_by_ids(&[live, deleted, OwnerId::new()])
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id(), live);
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    #[ignore] // 需要 PostgreSQL 实例
    async fn test_add_image_is_idempotent_per_owner(pool: PgPool) {
        let repo = PostgresCatalogRepository::<Seminar>::new(pool.clone());
        let id = insert_seminar(&pool, 0, false).await;
        let seminar = repo.find_including_unpublished(&id).await.unwrap().unwrap();

        assert!(repo.add_image(&seminar, &image("m-1")).await.unwrap());
        assert!(!repo.add_image(&seminar, &image("m-1")).await.unwrap());

        let reloaded = repo.find_including_unpublished(&id).await.unwrap().unwrap();
        assert_eq!(reloaded.item().images.len(), 1);
        assert!(Owner::from(reloaded).has_image(&MediaServiceId::new("m-1")));
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    #[ignore] // 需要 PostgreSQL 实例
    async fn test_batch_insert_reports_new_associations(pool: PgPool) {
        let repo = PostgresCatalogRepository::<Seminar>::new(pool.clone());
        let first = insert_seminar(&pool, 0, false).await;
        let second = insert_seminar(&pool, 0, false).await;
        let seminars = repo
            .list_including_unpublished_by_ids(&[first, second])
            .await
            .unwrap();
        let first_entity = seminars.iter().find(|s| s.id() == first).unwrap();
        repo.add_image(first_entity, &image("m-2")).await.unwrap();

        let refs: Vec<&Seminar> = seminars.iter().collect();
        let inserted = repo.add_image_batch(&refs, &image("m-2")).await.unwrap();
        assert_eq!(inserted, vec![second]);

        let owners = repo
            .find_owner_ids_by_image_id(&MediaServiceId::new("m-2"), &[first, second])
            .await
            .unwrap();
        assert_eq!(owners.len(), 2);
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    #[ignore] // 需要 PostgreSQL 实例
    async fn test_batch_update_and_decrement(pool: PgPool) {
        let repo = PostgresCatalogRepository::<Seminar>::new(pool.clone());
        let ids = [
            insert_seminar(&pool, 0, false).await,
            insert_seminar(&pool, 1, false).await,
            insert_seminar(&pool, 4, false).await,
        ];
        let mut seminars = repo.list_including_unpublished_by_ids(&ids).await.unwrap();
        for seminar in &mut seminars {
            seminar.item_mut().uploaded_image_amount += 1;
        }

        let refs: Vec<&Seminar> = seminars.iter().collect();
        assert_eq!(repo.batch_update(&refs, 2).await.unwrap(), 3);
        assert_eq!(repo.decrement_image_count(&ids).await.unwrap(), 3);

        let zero = insert_seminar(&pool, 0, false).await;
        repo.decrement_image_count(&[zero]).await.unwrap();
        let reloaded = repo.find_including_unpublished(&zero).await.unwrap().unwrap();
        assert_eq!(reloaded.item().uploaded_image_amount, 0);
    }

    #[sqlx::test(migrator = "crate::MIGRATOR")]
    #[ignore] // 需要 PostgreSQL 实例
    async fn test_rollback_discards_writes(pool: PgPool) {
        let repo = PostgresCatalogRepository::<Seminar>::new(pool.clone());
        let id = insert_seminar(&pool, 0, false).await;

        let scope = repo.begin().await.unwrap();
        let tx_repo = repo.bind(&scope);
        assert!(tx_repo.begin().await.is_err());

        let mut seminar = tx_repo.find_including_unpublished(&id).await.unwrap().unwrap();
        tx_repo.add_image(&seminar, &image("m-3")).await.unwrap();
        seminar.item_mut().uploaded_image_amount = 1;
        tx_repo.batch_update(&[&seminar], 100).await.unwrap();
        scope.rollback().await.unwrap();

        let reloaded = repo.find_including_unpublished(&id).await.unwrap().unwrap();
        assert_eq!(reloaded.item().uploaded_image_amount, 0);
        assert!(reloaded.item().images.is_empty());
    }
}
