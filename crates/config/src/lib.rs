//! catalog-config - 配置加载库

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use thiserror::Error;

use secrecy::Secret;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] figment::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    // 开发环境: 10, 生产环境: 50
    match std::env::var("APP_ENV").as_deref() {
        Ok("production") => 50,
        _ => 10,
    }
}

fn default_acquire_timeout_secs() -> u64 {
    30
}

/// 遥测配置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub metrics_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            metrics_enabled: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// 图片归属配置
#[derive(Debug, Clone, Deserialize)]
pub struct ImagesConfig {
    /// 批量回写 owner 记录时每批的行数
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// 单次操作的超时时间（毫秒），为空表示不限制
    #[serde(default)]
    pub operation_timeout_ms: Option<u64>,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            operation_timeout_ms: None,
        }
    }
}

fn default_batch_size() -> usize {
    100
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_name: String,
    pub app_env: String,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub images: ImagesConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 依次合并 `{config_dir}/default.toml`、`{config_dir}/{APP_ENV}.toml`
    /// 以及 `CATALOG_` 前缀的环境变量（嵌套键用 `__` 分隔）。
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let figment = Figment::new()
            .merge(Toml::file(format!("{}/default.toml", config_dir)))
            .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
            .merge(Env::prefixed("CATALOG_").split("__"));

        Self::from_figment(figment)
    }

    /// 从已组装好的 Figment 中提取并校验配置
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.images.batch_size == 0 {
            return Err(ConfigError::Invalid(
                "images.batch_size must be greater than zero".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }
}
