// ==========================================
// 审计交叉核对系统 - 汇总计算器
// ==========================================
// 纯函数: MatchResult 列表 → Summary
// 红线: results 变化时必须服务端重算，不信任外部输入
// ==========================================

use crate::domain::{MatchResult, MatchStatus, Summary};

pub struct SummaryCalculator;

impl SummaryCalculator {
    /// 由核对结果派生汇总统计
    ///
    /// 不变式:
    /// - total = matching + non_matching
    /// - pct = round(matching / total * 100)，total=0 时为 0
    pub fn calculate(results: &[MatchResult]) -> Summary {
        let total_records = results.len() as i64;
        let matching_records = results
            .iter()
            .filter(|r| r.status == MatchStatus::Match)
            .count() as i64;
        let non_matching_records = total_records - matching_records;

        let match_percentage = if total_records > 0 {
            (matching_records as f64 / total_records as f64 * 100.0).round() as i64
        } else {
            0
        };

        Summary {
            total_records,
            matching_records,
            non_matching_records,
            match_percentage,
        }
    }
}
