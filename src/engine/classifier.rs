// ==========================================
// 审计交叉核对系统 - 匹配分类器
// ==========================================
// 规则: 去重来源文件数 > 1 → Match，否则 NoMatch
// 报告值策略: 聚合时已按首个非空值选定（文件顺序、行顺序）
// ==========================================

use crate::domain::{MatchResult, MatchStatus};
use crate::engine::aggregator::AggregationOutput;
use serde_json::json;

pub struct MatchClassifier;

impl MatchClassifier {
    /// 将聚合条目转为有序的核对结论列表（保首见顺序）
    pub fn classify(aggregation: AggregationOutput) -> Vec<MatchResult> {
        aggregation
            .into_ordered()
            .into_iter()
            .map(|(key_value, occurrence)| {
                let status = if occurrence.distinct_file_count() > 1 {
                    MatchStatus::Match
                } else {
                    MatchStatus::NoMatch
                };

                MatchResult {
                    key_value,
                    result_value: occurrence.result_value.unwrap_or_default(),
                    status,
                    metadata: json!({ "occurrences": occurrence.occurrences }),
                    source_files: occurrence.source_files,
                }
            })
            .collect()
    }
}
