//! Owner 适配器
//!
//! 把按实体类型划分的 [`CatalogRepository`] 包装成统一的 [`OwnerRepository`]，
//! 图片服务因此可以对任意实体类型复用同一套流程。

use std::marker::PhantomData;

use async_trait::async_trait;

use crate::domain::entities::{CatalogEntity, NewImage, Owner};
use crate::domain::repositories::{CatalogRepository, OwnerError, OwnerRepository, OwnerResult};
use crate::domain::value_objects::{MediaServiceId, OwnerId, OwnerKind};

pub struct OwnerAdapter<R, E> {
    repo: R,
    _entity: PhantomData<fn() -> E>,
}

impl<R, E> OwnerAdapter<R, E>
where
    R: CatalogRepository<E>,
    E: CatalogEntity,
{
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            _entity: PhantomData,
        }
    }

    fn downcast(owner: &Owner) -> OwnerResult<&E> {
        E::from_owner(owner).ok_or(OwnerError::IncorrectOwnerType {
            expected: E::KIND,
            actual: owner.kind(),
        })
    }

    fn downcast_all(owners: &[Owner]) -> OwnerResult<Vec<&E>> {
        owners.iter().map(|owner| Self::downcast(owner)).collect()
    }
}

impl<R: Clone, E> Clone for OwnerAdapter<R, E> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            _entity: PhantomData,
        }
    }
}

#[async_trait]
impl<R, E> OwnerRepository for OwnerAdapter<R, E>
where
    R: CatalogRepository<E>,
    E: CatalogEntity,
{
    type Scope = R::Scope;

    fn kind(&self) -> OwnerKind {
        E::KIND
    }

    async fn begin(&self) -> OwnerResult<Self::Scope> {
        Ok(self.repo.begin().await?)
    }

    fn bind(&self, scope: &Self::Scope) -> Self {
        Self::new(self.repo.bind(scope))
    }

    async fn get_including_unpublished(&self, id: &OwnerId) -> OwnerResult<Option<Owner>> {
        let entity = self.repo.find_including_unpublished(id).await?;
        Ok(entity.map(E::into_owner))
    }

    async fn list_including_unpublished_by_ids(&self, ids: &[OwnerId]) -> OwnerResult<Vec<Owner>> {
        let entities = self.repo.list_including_unpublished_by_ids(ids).await?;
        Ok(entities.into_iter().map(E::into_owner).collect())
    }

    async fn add_image(&self, owner: &Owner, image: &NewImage) -> OwnerResult<bool> {
        let entity = Self::downcast(owner)?;
        Ok(self.repo.add_image(entity, image).await?)
    }

    async fn delete_image(
        &self,
        owner: &Owner,
        media_service_id: &MediaServiceId,
    ) -> OwnerResult<bool> {
        let entity = Self::downcast(owner)?;
        Ok(self.repo.delete_image(entity, media_service_id).await?)
    }

    async fn add_image_batch(
        &self,
        owners: &[Owner],
        image: &NewImage,
    ) -> OwnerResult<Vec<OwnerId>> {
        let entities = Self::downcast_all(owners)?;
        Ok(self.repo.add_image_batch(&entities, image).await?)
    }

    async fn delete_image_batch(
        &self,
        owners: &[Owner],
        media_service_id: &MediaServiceId,
    ) -> OwnerResult<u64> {
        let entities = Self::downcast_all(owners)?;
        Ok(self
            .repo
            .delete_image_batch(&entities, media_service_id)
            .await?)
    }

    async fn batch_update(&self, owners: &[Owner], batch_size: usize) -> OwnerResult<u64> {
        let entities = Self::downcast_all(owners)?;
        Ok(self.repo.batch_update(&entities, batch_size).await?)
    }

    async fn find_owner_ids_by_image_id(
        &self,
        media_service_id: &MediaServiceId,
        ids: &[OwnerId],
    ) -> OwnerResult<Vec<OwnerId>> {
        Ok(self
            .repo
            .find_owner_ids_by_image_id(media_service_id, ids)
            .await?)
    }

    async fn decrement_image_count(&self, ids: &[OwnerId]) -> OwnerResult<u64> {
        Ok(self.repo.decrement_image_count(ids).await?)
    }
}
