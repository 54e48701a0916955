//! 测试用内存仓储
//!
//! 事务通过快照实现：begin 时复制全部数据，rollback 或作用域被丢弃时恢复。
//! 可以让指定操作失败或延迟，用于验证回滚和超时。

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use catalog_errors::{AppError, AppResult};
use catalog_ports::TransactionScope;
use catalog_service::domain::entities::{CatalogEntity, CatalogItem, Image, NewImage};
use catalog_service::domain::repositories::CatalogRepository;
use catalog_service::domain::value_objects::{MediaServiceId, OwnerId};
use chrono::Utc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Begin,
    Find,
    List,
    AddImage,
    DeleteImage,
    AddImageBatch,
    DeleteImageBatch,
    BatchUpdate,
    FindOwnerIds,
    Decrement,
}

type Store<E> = Arc<Mutex<BTreeMap<OwnerId, E>>>;

pub struct InMemoryCatalogRepository<E> {
    store: Store<E>,
    failures: Arc<Mutex<HashSet<Operation>>>,
    delays: Arc<Mutex<HashMap<Operation, Duration>>>,
    bound: bool,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for InMemoryCatalogRepository<E> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            failures: self.failures.clone(),
            delays: self.delays.clone(),
            bound: self.bound,
            _entity: PhantomData,
        }
    }
}

impl<E: CatalogEntity> InMemoryCatalogRepository<E> {
    pub fn new() -> Self {
        Self {
            store: Arc::new(Mutex::new(BTreeMap::new())),
            failures: Arc::new(Mutex::new(HashSet::new())),
            delays: Arc::new(Mutex::new(HashMap::new())),
            bound: false,
            _entity: PhantomData,
        }
    }

    pub fn seed(&self, entity: E) -> OwnerId {
        let id = entity.id();
        self.store.lock().unwrap().insert(id, entity);
        id
    }

    /// 当前已提交（或事务中可见）的实体
    pub fn entity(&self, id: &OwnerId) -> E {
        self.store.lock().unwrap().get(id).cloned().unwrap()
    }

    pub fn fail_on(&self, op: Operation) {
        self.failures.lock().unwrap().insert(op);
    }

    pub fn delay(&self, op: Operation, duration: Duration) {
        self.delays.lock().unwrap().insert(op, duration);
    }

    async fn enter(&self, op: Operation) -> AppResult<()> {
        let delay = self.delays.lock().unwrap().get(&op).copied();
        if let Some(duration) = delay {
            tokio::time::sleep(duration).await;
        }
        if self.failures.lock().unwrap().contains(&op) {
            return Err(AppError::database(format!("injected failure: {:?}", op)));
        }
        Ok(())
    }
}

/// 创建带有 `count` 张图片的实体，计数与图片一致
pub fn entity_with_images<E: CatalogEntity>(name: &str, count: usize) -> E {
    let mut item = CatalogItem::new(name);
    for i in 0..count {
        let image = new_image(&format!("seed-{}", i));
        item.images.push(Image::attach(&image, E::KIND, item.id));
    }
    item.uploaded_image_amount = count as i32;
    E::from_item(item)
}

pub fn soft_deleted<E: CatalogEntity>(name: &str) -> E {
    let mut item = CatalogItem::new(name);
    item.deleted_at = Some(Utc::now());
    E::from_item(item)
}

pub fn new_image(media_service_id: &str) -> NewImage {
    NewImage {
        url: format!("http://media.example.com/{}.jpg", media_service_id),
        secure_url: format!("https://media.example.com/{}.jpg", media_service_id),
        public_id: format!("catalog/{}", media_service_id),
        media_service_id: MediaServiceId::new(media_service_id),
    }
}

fn has_image<E: CatalogEntity>(entity: &E, media_service_id: &MediaServiceId) -> bool {
    entity
        .item()
        .images
        .iter()
        .any(|image| &image.media_service_id == media_service_id)
}

fn is_live<E: CatalogEntity>(entity: &E) -> bool {
    !entity.item().is_deleted()
}

pub struct InMemoryScope<E> {
    store: Store<E>,
    snapshot: Option<BTreeMap<OwnerId, E>>,
}

impl<E> InMemoryScope<E> {
    fn restore(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            *self.store.lock().unwrap() = snapshot;
        }
    }
}

impl<E> Drop for InMemoryScope<E> {
    fn drop(&mut self) {
        self.restore();
    }
}

#[async_trait]
impl<E: CatalogEntity> TransactionScope for InMemoryScope<E> {
    async fn commit(self) -> AppResult<()> {
        let mut scope = self;
        scope.snapshot = None;
        Ok(())
    }

    async fn rollback(self) -> AppResult<()> {
        let mut scope = self;
        scope.restore();
        Ok(())
    }
}

#[async_trait]
impl<E: CatalogEntity> CatalogRepository<E> for InMemoryCatalogRepository<E> {
    type Scope = InMemoryScope<E>;

    async fn begin(&self) -> AppResult<Self::Scope> {
        if self.bound {
            return Err(AppError::internal("already bound to a transaction"));
        }
        self.enter(Operation::Begin).await?;
        let snapshot = self.store.lock().unwrap().clone();
        Ok(InMemoryScope {
            store: self.store.clone(),
            snapshot: Some(snapshot),
        })
    }

    fn bind(&self, _scope: &Self::Scope) -> Self {
        let mut bound = self.clone();
        bound.bound = true;
        bound
    }

    async fn find_including_unpublished(&self, id: &OwnerId) -> AppResult<Option<E>> {
        self.enter(Operation::Find).await?;
        let store = self.store.lock().unwrap();
        Ok(store.get(id).filter(|e| is_live(*e)).cloned())
    }

    async fn list_including_unpublished_by_ids(&self, ids: &[OwnerId]) -> AppResult<Vec<E>> {
        self.enter(Operation::List).await?;
        let store = self.store.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| store.get(id))
            .filter(|e| is_live(*e))
            .cloned()
            .collect())
    }

    async fn add_image(&self, entity: &E, image: &NewImage) -> AppResult<bool> {
        self.enter(Operation::AddImage).await?;
        let mut store = self.store.lock().unwrap();
        let stored = store
            .get_mut(&entity.id())
            .ok_or_else(|| AppError::database("owner row missing"))?;
        if has_image(stored, &image.media_service_id) {
            return Ok(false);
        }
        stored
            .item_mut()
            .images
            .push(Image::attach(image, E::KIND, entity.id()));
        Ok(true)
    }

    async fn delete_image(
        &self,
        entity: &E,
        media_service_id: &MediaServiceId,
    ) -> AppResult<bool> {
        self.enter(Operation::DeleteImage).await?;
        let mut store = self.store.lock().unwrap();
        let Some(stored) = store.get_mut(&entity.id()) else {
            return Ok(false);
        };
        let images = &mut stored.item_mut().images;
        let before = images.len();
        images.retain(|image| &image.media_service_id != media_service_id);
        Ok(images.len() < before)
    }

    async fn add_image_batch(&self, entities: &[&E], image: &NewImage) -> AppResult<Vec<OwnerId>> {
        self.enter(Operation::AddImageBatch).await?;
        let mut store = self.store.lock().unwrap();
        let mut inserted = Vec::new();
        for entity in entities {
            if let Some(stored) = store.get_mut(&entity.id()) {
                if !has_image(stored, &image.media_service_id) {
                    stored
                        .item_mut()
                        .images
                        .push(Image::attach(image, E::KIND, entity.id()));
                    inserted.push(entity.id());
                }
            }
        }
        Ok(inserted)
    }

    async fn delete_image_batch(
        &self,
        entities: &[&E],
        media_service_id: &MediaServiceId,
    ) -> AppResult<u64> {
        self.enter(Operation::DeleteImageBatch).await?;
        let mut store = self.store.lock().unwrap();
        let mut removed = 0;
        for entity in entities {
            if let Some(stored) = store.get_mut(&entity.id()) {
                let images = &mut stored.item_mut().images;
                let before = images.len();
                images.retain(|image| &image.media_service_id != media_service_id);
                removed += (before - images.len()) as u64;
            }
        }
        Ok(removed)
    }

    async fn batch_update(&self, entities: &[&E], batch_size: usize) -> AppResult<u64> {
        assert!(batch_size > 0);
        self.enter(Operation::BatchUpdate).await?;
        let mut store = self.store.lock().unwrap();
        let mut updated = 0;
        for entity in entities {
            if let Some(stored) = store.get_mut(&entity.id()).filter(|e| is_live(&**e)) {
                stored.item_mut().uploaded_image_amount = entity.item().uploaded_image_amount;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn find_owner_ids_by_image_id(
        &self,
        media_service_id: &MediaServiceId,
        ids: &[OwnerId],
    ) -> AppResult<Vec<OwnerId>> {
        self.enter(Operation::FindOwnerIds).await?;
        let store = self.store.lock().unwrap();
        Ok(ids
            .iter()
            .filter(|id| {
                store
                    .get(*id)
                    .is_some_and(|e| has_image(e, media_service_id))
            })
            .copied()
            .collect())
    }

    async fn decrement_image_count(&self, ids: &[OwnerId]) -> AppResult<u64> {
        self.enter(Operation::Decrement).await?;
        let mut store = self.store.lock().unwrap();
        let mut updated = 0;
        for id in ids {
            if let Some(stored) = store.get_mut(id).filter(|e| is_live(&**e)) {
                let item = stored.item_mut();
                item.uploaded_image_amount = (item.uploaded_image_amount - 1).max(0);
                updated += 1;
            }
        }
        Ok(updated)
    }
}
