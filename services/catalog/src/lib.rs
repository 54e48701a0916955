//! Catalog 图片归属服务
//!
//! 模块化架构：
//! - `domain`: 目录实体、多态 owner、仓储接口
//! - `application`: 命令、owner 适配器、图片服务和分派入口
//! - `infrastructure`: PostgreSQL 仓储和业务指标
//! - `runtime`: 配置加载后的 tracing / metrics / 连接池初始化

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod runtime;

pub use application::{ImageService, ImageServiceConfig, ServiceHandler};
pub use error::{ImageError, ImageResult};

/// 数据库迁移
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
