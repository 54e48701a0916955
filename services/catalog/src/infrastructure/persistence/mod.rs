//! 持久化

mod postgres_catalog_repository;
mod rows;

pub use postgres_catalog_repository::PostgresCatalogRepository;
