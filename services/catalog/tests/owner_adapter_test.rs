//! Owner 适配器测试

mod support;

use catalog_errors::AppError;
use catalog_service::application::OwnerAdapter;
use catalog_service::domain::entities::{
    CatalogEntity, Owner, PhysicalGood, Seminar, TrainingSession,
};
use catalog_service::domain::repositories::{OwnerError, OwnerRepository};
use catalog_service::domain::value_objects::{MediaServiceId, OwnerId, OwnerKind};
use support::{entity_with_images, new_image, InMemoryCatalogRepository, Operation};

type Sessions = OwnerAdapter<InMemoryCatalogRepository<TrainingSession>, TrainingSession>;

fn sessions() -> (InMemoryCatalogRepository<TrainingSession>, Sessions) {
    let repo = InMemoryCatalogRepository::new();
    (repo.clone(), OwnerAdapter::new(repo))
}

fn assert_incorrect_type<T: std::fmt::Debug>(result: Result<T, OwnerError>) {
    match result {
        Err(OwnerError::IncorrectOwnerType { expected, actual }) => {
            assert_eq!(expected, OwnerKind::TrainingSession);
            assert_eq!(actual, OwnerKind::PhysicalGood);
        }
        other => panic!("expected IncorrectOwnerType, got {:?}", other),
    }
}

#[tokio::test]
async fn test_adapter_reports_its_kind() {
    let (_repo, owners) = sessions();
    assert_eq!(owners.kind(), OwnerKind::TrainingSession);
}

#[tokio::test]
async fn test_get_wraps_entity_as_owner() {
    let (repo, owners) = sessions();
    let id = repo.seed(entity_with_images::<TrainingSession>("Onboarding", 2));

    let owner = owners.get_including_unpublished(&id).await.unwrap().unwrap();
    assert_eq!(owner.kind(), OwnerKind::TrainingSession);
    assert_eq!(owner.id(), id);
    assert_eq!(owner.uploaded_image_amount(), 2);
    assert!(owner.has_image(&MediaServiceId::new("seed-1")));

    assert!(owners
        .get_including_unpublished(&OwnerId::new())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_foreign_owner_rejected() {
    let (_repo, owners) = sessions();
    let foreign: Owner = PhysicalGood::new("Desk lamp").into_owner();
    let media_service_id = MediaServiceId::new("m-1");

    assert_incorrect_type(owners.add_image(&foreign, &new_image("m-1")).await);
    assert_incorrect_type(owners.delete_image(&foreign, &media_service_id).await);
    assert_incorrect_type(
        owners
            .add_image_batch(std::slice::from_ref(&foreign), &new_image("m-1"))
            .await,
    );
    assert_incorrect_type(
        owners
            .delete_image_batch(std::slice::from_ref(&foreign), &media_service_id)
            .await,
    );
    assert_incorrect_type(owners.batch_update(std::slice::from_ref(&foreign), 10).await);
}

#[tokio::test]
async fn test_mixed_batch_rejected_without_writes() {
    let (repo, owners) = sessions();
    let id = repo.seed(TrainingSession::new("Onboarding"));
    let batch = vec![
        repo.entity(&id).into_owner(),
        Seminar::new("Ops night").into_owner(),
    ];

    let result = owners.add_image_batch(&batch, &new_image("m-2")).await;

    assert!(matches!(
        result,
        Err(OwnerError::IncorrectOwnerType {
            actual: OwnerKind::Seminar,
            ..
        })
    ));
    assert!(repo.entity(&id).item().images.is_empty());
}

#[tokio::test]
async fn test_storage_errors_pass_through() {
    let (repo, owners) = sessions();
    let id = repo.seed(TrainingSession::new("Onboarding"));
    repo.fail_on(Operation::Find);

    let result = owners.get_including_unpublished(&id).await;
    assert!(matches!(
        result,
        Err(OwnerError::Storage(AppError::Database(_)))
    ));
}
