//! catalog-errors - 统一错误处理
//!
//! 基于 RFC 7807 Problem Details 规范，传输层据此映射 HTTP / gRPC 状态码

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Problem Details `type` 字段的前缀
const PROBLEM_TYPE_BASE: &str = "urn:catalog:problem";

/// 应用错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),

    #[error("Deadline exceeded: {0}")]
    DeadlineExceeded(String),
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn failed_precondition(msg: impl Into<String>) -> Self {
        Self::FailedPrecondition(msg.into())
    }

    pub fn deadline_exceeded(msg: impl Into<String>) -> Self {
        Self::DeadlineExceeded(msg.into())
    }

    /// 转换为 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::Conflict(_) => 409,
            Self::Internal(_) | Self::Database(_) => 500,
            Self::FailedPrecondition(_) => 412,
            Self::DeadlineExceeded(_) => 504,
        }
    }

    /// 转换为 gRPC 状态码
    pub fn grpc_code(&self) -> tonic::Code {
        match self {
            Self::NotFound(_) => tonic::Code::NotFound,
            Self::Validation(_) => tonic::Code::InvalidArgument,
            Self::Conflict(_) => tonic::Code::AlreadyExists,
            Self::Internal(_) | Self::Database(_) => tonic::Code::Internal,
            Self::FailedPrecondition(_) => tonic::Code::FailedPrecondition,
            Self::DeadlineExceeded(_) => tonic::Code::DeadlineExceeded,
        }
    }

    /// 转换为 Problem Details
    pub fn to_problem_details(&self) -> ProblemDetails {
        ProblemDetails {
            r#type: format!("{}:{}", PROBLEM_TYPE_BASE, self.problem_slug()),
            title: self.problem_title().to_string(),
            status: self.status_code(),
            detail: self.to_string(),
            instance: None,
        }
    }

    fn problem_slug(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not-found",
            Self::Validation(_) => "validation",
            Self::Conflict(_) => "conflict",
            Self::Internal(_) => "internal",
            Self::Database(_) => "database",
            Self::FailedPrecondition(_) => "failed-precondition",
            Self::DeadlineExceeded(_) => "deadline-exceeded",
        }
    }

    fn problem_title(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "Resource Not Found",
            Self::Validation(_) => "Validation Error",
            Self::Conflict(_) => "Conflict",
            Self::Internal(_) => "Internal Server Error",
            Self::Database(_) => "Database Error",
            Self::FailedPrecondition(_) => "Failed Precondition",
            Self::DeadlineExceeded(_) => "Deadline Exceeded",
        }
    }
}

impl From<AppError> for tonic::Status {
    fn from(err: AppError) -> Self {
        tonic::Status::new(err.grpc_code(), err.to_string())
    }
}

/// RFC 7807 Problem Details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    pub r#type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

/// Result 类型别名
pub type AppResult<T> = Result<T, AppError>;
