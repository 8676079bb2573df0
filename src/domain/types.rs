// ==========================================
// 审计交叉核对系统 - 领域类型定义
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 执行状态 (Cross Status)
// ==========================================
// 状态机: InProgress → {Completed, Error}，两者均为终态
// 终态之间仅允许人工 update 修正，不允许回退到 InProgress
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrossStatus {
    InProgress, // 执行中（同步实现不落库此状态）
    Completed,  // 正常完成
    Error,      // 执行失败（error_details 非空）
}

impl CrossStatus {
    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            CrossStatus::InProgress => "IN_PROGRESS",
            CrossStatus::Completed => "COMPLETED",
            CrossStatus::Error => "ERROR",
        }
    }

    /// 从字符串解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "IN_PROGRESS" => Some(CrossStatus::InProgress),
            "COMPLETED" => Some(CrossStatus::Completed),
            "ERROR" => Some(CrossStatus::Error),
            _ => None,
        }
    }

    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CrossStatus::InProgress)
    }
}

impl fmt::Display for CrossStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 匹配判定 (Match Status)
// ==========================================
// 规则: 同一键值出现在 >1 个不同来源文件 → Match，否则 NoMatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Match,   // 跨文件命中
    NoMatch, // 仅出现在单一文件
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Match => "MATCH",
            MatchStatus::NoMatch => "NO_MATCH",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "MATCH" => Some(MatchStatus::Match),
            "NO_MATCH" => Some(MatchStatus::NoMatch),
            _ => None,
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_status_roundtrip() {
        for status in [
            CrossStatus::InProgress,
            CrossStatus::Completed,
            CrossStatus::Error,
        ] {
            assert_eq!(CrossStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(CrossStatus::from_str("UNKNOWN"), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!CrossStatus::InProgress.is_terminal());
        assert!(CrossStatus::Completed.is_terminal());
        assert!(CrossStatus::Error.is_terminal());
    }

    #[test]
    fn test_match_status_roundtrip() {
        assert_eq!(MatchStatus::from_str("MATCH"), Some(MatchStatus::Match));
        assert_eq!(MatchStatus::from_str("NO_MATCH"), Some(MatchStatus::NoMatch));
        assert_eq!(MatchStatus::from_str(""), None);
    }
}
