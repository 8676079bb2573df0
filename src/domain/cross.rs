// ==========================================
// 审计交叉核对系统 - 交叉核对领域模型
// ==========================================
// CrossExecution 为聚合根: 一次交叉核对 = 一条记录
// 对齐: cross_execution 表
// ==========================================

use crate::domain::types::{CrossStatus, MatchStatus};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// ProcessedFileDescriptor - 输入文件摘要
// ==========================================
// 嵌入在 CrossExecution 中 (processed_files_json)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedFileDescriptor {
    pub filename: String,          // 参与核对时使用的展示文件名
    pub original_name: String,     // 上传时的原始文件名
    pub record_count: i64,         // 本文件解析出的数据行数
    pub upload_date: NaiveDateTime, // 上传时间
}

// ==========================================
// MatchResult - 单个键值的核对结论
// ==========================================
// 不变式:
// - source_files ⊆ 本次执行的 processed_files 文件名集合
// - status = Match 当且仅当 source_files 的去重数量 > 1
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub key_value: String,         // 键列取值（非空）
    pub result_value: String,      // 报告列取值（按首个非空值策略选取）
    pub status: MatchStatus,       // 匹配判定
    pub source_files: Vec<String>, // 含该键值的来源文件（去重，按选择顺序）
    pub metadata: JsonValue,       // 附加信息（每文件出现次数等）
}

// ==========================================
// Summary - 汇总统计
// ==========================================
// 永远由 results 派生，不接受外部赋值
// 不变式: total = matching + non_matching;
//         pct = round(matching / total * 100)，total=0 时为 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total_records: i64,
    pub matching_records: i64,
    pub non_matching_records: i64,
    pub match_percentage: i64,
}

impl Summary {
    /// 空汇总（零值）
    pub fn zero() -> Self {
        Self {
            total_records: 0,
            matching_records: 0,
            non_matching_records: 0,
            match_percentage: 0,
        }
    }
}

// ==========================================
// ExecutionDetails - 执行元数据
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionDetails {
    pub started_at: NaiveDateTime,
    pub finished_at: NaiveDateTime,
    pub duration_ms: i64,
    pub executed_by: String,
}

// ==========================================
// ErrorDetails - 失败执行的错误记录
// ==========================================
// stack 保存完整错误链文本（非语言栈回溯）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub message: String,
    pub stack: String,
    pub timestamp: NaiveDateTime,
}

// ==========================================
// CrossExecution - 聚合根
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossExecution {
    pub cross_id: String,          // 唯一ID（时间戳+随机段）
    pub audit_id: String,          // 审计项目引用（规范化后的唯一写入形态）
    pub key_field: String,         // 键列名
    pub result_field: String,      // 报告列名
    pub processed_files: Vec<ProcessedFileDescriptor>,
    pub results: Vec<MatchResult>,
    pub summary: Summary,
    pub execution_details: ExecutionDetails,
    pub status: CrossStatus,
    pub error_details: Option<ErrorDetails>,
    pub revision: i64,             // 乐观锁修订号（update 时递增）
}

impl CrossExecution {
    /// 匹配结果条数（删除时写入操作日志）
    pub fn result_count(&self) -> i64 {
        self.results.len() as i64
    }
}

// ==========================================
// NewCrossExecution - create 入参
// ==========================================
// summary 不在入参中: create 内部重新计算（服务端派生）
// source_file_ids 与 processed_files 按选择顺序一一对应，
// 供落库事务内更新文件使用痕迹
#[derive(Debug, Clone)]
pub struct NewCrossExecution {
    pub audit_id: String,
    pub key_field: String,
    pub result_field: String,
    pub source_file_ids: Vec<String>,
    pub processed_files: Vec<ProcessedFileDescriptor>,
    pub results: Vec<MatchResult>,
    pub execution_details: ExecutionDetails,
    pub status: CrossStatus,
    pub error_details: Option<ErrorDetails>,
}

// ==========================================
// CrossExecutionPatch - update 入参（部分更新）
// ==========================================
// results 被更新时 summary 必须由服务端重算
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrossExecutionPatch {
    pub key_field: Option<String>,
    pub result_field: Option<String>,
    pub results: Option<Vec<MatchResult>>,
    pub status: Option<CrossStatus>,
}

impl CrossExecutionPatch {
    /// 是否为空补丁（没有任何待更新字段）
    pub fn is_empty(&self) -> bool {
        self.key_field.is_none()
            && self.result_field.is_none()
            && self.results.is_none()
            && self.status.is_none()
    }
}

// ==========================================
// CrossStats - 按审计项目聚合的统计
// ==========================================
// 无任何执行记录时返回零值结构，而非错误
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossStats {
    pub total_crosses: i64,
    pub total_records: i64,
    pub total_matches: i64,
    pub avg_match_percentage: f64,
    pub last_execution: Option<NaiveDateTime>,
}

impl CrossStats {
    pub fn zero() -> Self {
        Self {
            total_crosses: 0,
            total_records: 0,
            total_matches: 0,
            avg_match_percentage: 0.0,
            last_execution: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_is_empty() {
        let patch = CrossExecutionPatch::default();
        assert!(patch.is_empty());

        let patch = CrossExecutionPatch {
            status: Some(CrossStatus::Completed),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_zero_stats() {
        let stats = CrossStats::zero();
        assert_eq!(stats.total_crosses, 0);
        assert_eq!(stats.avg_match_percentage, 0.0);
        assert!(stats.last_execution.is_none());
    }
}
