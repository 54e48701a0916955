//! 服务运行时

use std::time::Duration;

use catalog_adapter_postgres::{check_connection, create_pool, PostgresConfig};
use catalog_config::AppConfig;
use catalog_errors::{AppError, AppResult};
use catalog_telemetry::{
    init_metrics, init_tracing, init_tracing_json, PrometheusHandle, TelemetryError,
};
use secrecy::ExposeSecret;
use tracing::info;

use crate::application::{ImageService, ImageServiceConfig, ServiceHandler};
use crate::MIGRATOR;

/// 初始化 tracing 和 metrics
///
/// 生产环境输出 JSON 日志；未启用 metrics 时返回 None。
pub fn init_runtime(config: &AppConfig) -> Result<Option<PrometheusHandle>, TelemetryError> {
    if config.is_production() {
        init_tracing_json(&config.telemetry.log_level)?;
    } else {
        init_tracing(&config.telemetry.log_level)?;
    }

    let metrics = if config.telemetry.metrics_enabled {
        Some(init_metrics()?)
    } else {
        None
    };

    info!(
        app_name = %config.app_name,
        app_env = %config.app_env,
        metrics_enabled = config.telemetry.metrics_enabled,
        "Runtime initialized"
    );
    Ok(metrics)
}

/// 创建连接池、执行迁移并组装 [`ServiceHandler`]
pub async fn build_handler(config: &AppConfig) -> AppResult<ServiceHandler> {
    let pg_config = PostgresConfig::new(config.database.url.expose_secret().clone())
        .with_max_connections(config.database.max_connections)
        .with_acquire_timeout(Duration::from_secs(config.database.acquire_timeout_secs));

    let pool = create_pool(&pg_config).await?;
    check_connection(&pool).await?;

    MIGRATOR
        .run(&pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to run migrations: {}", e)))?;
    info!("Database migrations applied");

    let images = ImageService::new(ImageServiceConfig::from(&config.images));
    Ok(ServiceHandler::new(pool, images))
}
