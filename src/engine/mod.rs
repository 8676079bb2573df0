// ==========================================
// 审计交叉核对系统 - 引擎层
// ==========================================
// 职责: 聚合、分类、汇总、执行编排
// 红线: 不含数据访问逻辑（落库由 repository 层负责）
// ==========================================

pub mod aggregator;
pub mod classifier;
pub mod cross_runner;
pub mod error;
pub mod summary;

// 重导出核心类型
pub use aggregator::{AggregationOutput, KeyOccurrence, KeyOccurrenceAggregator};
pub use classifier::MatchClassifier;
pub use cross_runner::{CrossExecutor, CrossOutcome, CrossRequest, CrossRunner};
pub use error::{EngineError, EngineResult};
pub use summary::SummaryCalculator;
