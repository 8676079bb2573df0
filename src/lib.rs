// ==========================================
// 审计交叉核对系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 审计底稿表格数据的交叉核对引擎
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 聚合/分类/汇总/编排
pub mod engine;

// 摄取层 - 外部表格数据
pub mod ingest;

// 数据库基础设施（连接初始化/PRAGMA/建表统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{CrossStatus, MatchStatus};

// 领域实体
pub use domain::{
    ActionLog, ActionType, AuditRecord, CrossExecution, CrossExecutionPatch, CrossStats,
    ErrorDetails, ExecutionDetails, FileRecord, MatchResult, NewCrossExecution,
    ProcessedFileDescriptor, Summary,
};

// 引擎
pub use engine::{
    CrossExecutor, CrossOutcome, CrossRequest, CrossRunner, KeyOccurrenceAggregator,
    MatchClassifier, SummaryCalculator,
};

// API
pub use api::{ApiError, CrossApi, FailurePayload};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "审计交叉核对系统";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
