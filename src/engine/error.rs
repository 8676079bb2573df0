// ==========================================
// 审计交叉核对系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::ingest::IngestError;
use thiserror::Error;

/// 引擎层错误类型
///
/// 受管执行中抛出的引擎错误在运行边界被捕获并记入
/// error_details，不向调用方传播（见 CrossRunner）
#[derive(Error, Debug)]
pub enum EngineError {
    // ===== 摄取错误 =====
    #[error(transparent)]
    Ingest(#[from] IngestError),

    // ===== 表结构错误 =====
    #[error("文件 {file} 缺少键列: {column}")]
    MissingKeyColumn { file: String, column: String },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
