// ==========================================
// 审计交叉核对系统 - 审计项目目录
// ==========================================
// 审计项目本身由外部系统管理，这里只保留
// 交叉核对引擎需要消费的目录视图
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// AuditRecord - 审计项目
// ==========================================
// audit_id 为规范化引用（写入 cross_execution 的唯一形态）
// audit_code 为展示编号，仅用于人工查找
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub audit_id: String,
    pub audit_code: String,
    pub audit_name: String,
    pub client_name: Option<String>,
    pub status: String,
    pub created_at: NaiveDateTime,
}

impl AuditRecord {
    pub fn new(audit_id: String, audit_code: String, audit_name: String) -> Self {
        Self {
            audit_id,
            audit_code,
            audit_name,
            client_name: None,
            status: "ACTIVE".to_string(),
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    pub fn with_client(mut self, client_name: String) -> Self {
        self.client_name = Some(client_name);
        self
    }
}
