//! catalog-telemetry - 可观测性库

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub use metrics_exporter_prometheus::PrometheusHandle;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// 遥测初始化错误
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Failed to install tracing subscriber: {0}")]
    Tracing(#[from] tracing_subscriber::util::TryInitError),

    #[error("Failed to install Prometheus recorder: {0}")]
    Metrics(#[from] BuildError),
}

fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level))
}

/// 初始化 tracing
pub fn init_tracing(log_level: &str) -> Result<(), TelemetryError> {
    tracing_subscriber::registry()
        .with(env_filter(log_level))
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;
    Ok(())
}

/// 初始化 JSON 格式的 tracing（生产环境）
pub fn init_tracing_json(log_level: &str) -> Result<(), TelemetryError> {
    tracing_subscriber::registry()
        .with(env_filter(log_level))
        .with(tracing_subscriber::fmt::layer().json())
        .try_init()?;
    Ok(())
}

/// 初始化 Prometheus metrics
pub fn init_metrics() -> Result<PrometheusHandle, TelemetryError> {
    Ok(PrometheusBuilder::new().install_recorder()?)
}
