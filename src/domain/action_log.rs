// ==========================================
// 审计交叉核对系统 - 操作日志领域模型
// ==========================================
// 红线: 所有写入类操作必须记录
// 用途: 审计追踪
// 对齐: action_log 表
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,              // 日志ID (UUID)
    pub audit_id: Option<String>,       // 关联审计项目（系统级操作可为 None）
    pub action_type: String,            // 操作类型 (存储为字符串)
    pub action_ts: NaiveDateTime,       // 操作时间戳
    pub actor: String,                  // 操作人
    pub detail: Option<String>,         // 详细描述
    pub previous_json: Option<JsonValue>, // 操作前快照 (JSON)
    pub new_json: Option<JsonValue>,    // 操作后快照 (JSON)
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    CrossExecute, // 执行交叉核对
    CrossUpdate,  // 人工修正核对记录
    CrossDelete,  // 删除核对记录
    FileRegister, // 登记上传文件
}

impl ActionType {
    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::CrossExecute => "CrossExecute",
            ActionType::CrossUpdate => "CrossUpdate",
            ActionType::CrossDelete => "CrossDelete",
            ActionType::FileRegister => "FileRegister",
        }
    }

    /// 从字符串解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "CrossExecute" => Some(ActionType::CrossExecute),
            "CrossUpdate" => Some(ActionType::CrossUpdate),
            "CrossDelete" => Some(ActionType::CrossDelete),
            "FileRegister" => Some(ActionType::FileRegister),
            _ => None,
        }
    }
}

// ==========================================
// ActionLog 辅助方法
// ==========================================
impl ActionLog {
    /// 创建新的操作日志
    ///
    /// # 参数
    /// - `audit_id`: 关联审计项目ID (可选)
    /// - `action_type`: 操作类型
    /// - `actor`: 操作人
    pub fn new(audit_id: Option<String>, action_type: ActionType, actor: String) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            audit_id,
            action_type: action_type.as_str().to_string(),
            action_ts: chrono::Utc::now().naive_utc(),
            actor,
            detail: None,
            previous_json: None,
            new_json: None,
        }
    }

    /// 设置详细描述
    pub fn with_detail(mut self, detail: String) -> Self {
        self.detail = Some(detail);
        self
    }

    /// 设置操作前快照 (转换为JSON)
    pub fn with_previous<T: Serialize>(mut self, previous: &T) -> Self {
        self.previous_json = serde_json::to_value(previous).ok();
        self
    }

    /// 设置操作后快照 (转换为JSON)
    pub fn with_new<T: Serialize>(mut self, new: &T) -> Self {
        self.new_json = serde_json::to_value(new).ok();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_type_roundtrip() {
        for t in [
            ActionType::CrossExecute,
            ActionType::CrossUpdate,
            ActionType::CrossDelete,
            ActionType::FileRegister,
        ] {
            assert_eq!(ActionType::from_str(t.as_str()), Some(t));
        }
        assert_eq!(ActionType::from_str("Unknown"), None);
    }

    #[test]
    fn test_builder() {
        let log = ActionLog::new(
            Some("A001".to_string()),
            ActionType::CrossDelete,
            "auditor".to_string(),
        )
        .with_detail("removed".to_string())
        .with_new(&serde_json::json!({"removed_results": 3}));

        assert_eq!(log.action_type, "CrossDelete");
        assert!(log.new_json.is_some());
        assert!(log.previous_json.is_none());
    }
}
