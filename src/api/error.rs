// ==========================================
// 审计交叉核对系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换仓储/摄取错误为用户可读的错误
// 约定: 用户可见失败以 {success:false, message, detail} 返回
// ==========================================

use crate::ingest::IngestError;
use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 请求校验错误（执行开始前，不落库）
    // ==========================================
    #[error("无效输入: {0}")]
    ValidationError(String),

    #[error("审计项目不存在: {0}")]
    AuditNotFound(String),

    // ==========================================
    // 业务错误
    // ==========================================
    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("文件摄取失败: {0}")]
    IngestError(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    // ==========================================
    // 并发控制错误
    // ==========================================
    #[error("版本冲突: {0}")]
    VersionConflict(String),

    #[error("标识符冲突: {0}")]
    Conflict(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("存储服务不可用: {0}")]
    ServiceUnavailable(String),

    #[error("数据库错误: {0}")]
    DatabaseError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 稳定错误码（FailurePayload.detail 使用）
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::AuditNotFound(_) => "AUDIT_NOT_FOUND",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::IngestError(_) => "INGESTION_ERROR",
            ApiError::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            ApiError::VersionConflict(_) => "VERSION_CONFLICT",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
            ApiError::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// 转为用户可见的失败载荷
    pub fn to_payload(&self) -> FailurePayload {
        FailurePayload {
            success: false,
            message: self.to_string(),
            detail: self.code().to_string(),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将仓储层的技术错误转换为用户可读的业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // 并发控制错误
            RepositoryError::VersionConflict {
                cross_id,
                expected,
                actual,
            } => ApiError::VersionConflict(format!(
                "记录{}已被其他用户修改（期望revision={}，实际revision={}）",
                cross_id, expected, actual
            )),

            // 数据库错误
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::ServiceUnavailable(msg),
            RepositoryError::LockError(msg) => {
                ApiError::ServiceUnavailable(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::Conflict(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::Conflict(format!("外键约束违反: {}", msg))
            }

            // 业务规则错误
            RepositoryError::InvalidStateTransition { from, to } => {
                ApiError::InvalidStateTransition { from, to }
            }

            // 数据质量错误
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),

            // 通用错误
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 IngestError 转换
// 说明: 仅用于执行边界之外的摄取失败（如文件登记时探测）；
//       受管执行内的摄取错误由运行边界转为 Error 记录
// ==========================================
impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        ApiError::IngestError(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

// ==========================================
// FailurePayload - 用户可见失败载荷
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailurePayload {
    pub success: bool, // 恒为 false
    pub message: String,
    pub detail: String, // 稳定错误码
}
