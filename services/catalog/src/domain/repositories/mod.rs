//! 仓储接口

mod catalog_repository;
mod owner_repository;

pub use catalog_repository::*;
pub use owner_repository::*;
