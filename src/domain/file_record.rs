// ==========================================
// 审计交叉核对系统 - 上传文件登记
// ==========================================
// 文件字节由外部 Blob 存储负责；引擎只登记引用与使用痕迹
// 对齐: file_record 表
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// FileRecord - 文件登记项
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub file_id: String,           // 文件引用ID
    pub audit_id: String,          // 所属审计项目
    pub original_name: String,     // 上传时的原始文件名
    pub stored_name: String,       // 存储层内部文件名（展示名）
    pub storage_path: String,      // 本地 Blob 存储中的绝对路径
    pub record_count: Option<i64>, // 最近一次解析的数据行数
    pub uploaded_at: NaiveDateTime,
    pub uploaded_by: Option<String>,
    pub use_count: i64,            // 参与交叉核对的次数
    pub last_used_at: Option<NaiveDateTime>,
}

impl FileRecord {
    pub fn new(
        file_id: String,
        audit_id: String,
        original_name: String,
        stored_name: String,
        storage_path: String,
    ) -> Self {
        Self {
            file_id,
            audit_id,
            original_name,
            stored_name,
            storage_path,
            record_count: None,
            uploaded_at: chrono::Utc::now().naive_utc(),
            uploaded_by: None,
            use_count: 0,
            last_used_at: None,
        }
    }

    pub fn with_uploader(mut self, uploaded_by: String) -> Self {
        self.uploaded_by = Some(uploaded_by);
        self
    }
}
