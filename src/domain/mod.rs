// ==========================================
// 审计交叉核对系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、业务不变式
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod audit;
pub mod cross;
pub mod file_record;
pub mod types;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use audit::AuditRecord;
pub use cross::{
    CrossExecution, CrossExecutionPatch, CrossStats, ErrorDetails, ExecutionDetails, MatchResult,
    NewCrossExecution, ProcessedFileDescriptor, Summary,
};
pub use file_record::FileRecord;
pub use types::{CrossStatus, MatchStatus};
