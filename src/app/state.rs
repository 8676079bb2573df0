// ==========================================
// 审计交叉核对系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::CrossApi;
use crate::db;
use crate::engine::{CrossExecutor, CrossRunner};
use crate::ingest::{BlobStore, LocalBlobStore, TabularIngestor, TabularIngestorImpl};
use crate::repository::{
    ActionLogRepository, AuditRepository, CrossExecutionRepository, FileRecordRepository,
};

/// 应用状态
///
/// 包含API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 交叉核对API
    pub cross_api: Arc<CrossApi>,

    /// 审计目录仓储（供种子数据/查询使用）
    pub audit_repo: Arc<AuditRepository>,

    /// 操作日志仓储（用于审计追踪）
    pub action_log_repo: Arc<ActionLogRepository>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开共享数据库连接并初始化 schema
    /// 2. 初始化所有Repository
    /// 3. 装配摄取适配器与执行编排器
    /// 4. 创建API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        // 创建数据库连接（共享连接，统一 PRAGMA）
        let conn = db::open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        db::init_schema(&conn).map_err(|e| format!("无法初始化schema: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let audit_repo = Arc::new(AuditRepository::new(conn.clone()));
        let file_repo = Arc::new(FileRecordRepository::new(conn.clone()));
        let cross_repo = Arc::new(CrossExecutionRepository::new(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));

        // ==========================================
        // 初始化引擎层
        // ==========================================
        let blob_store: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::new(file_repo.clone()));
        let ingestor: Arc<dyn TabularIngestor> = Arc::new(TabularIngestorImpl::new(blob_store));
        let runner: Arc<dyn CrossExecutor> = Arc::new(CrossRunner::new(ingestor));

        // ==========================================
        // 初始化API层
        // ==========================================
        let cross_api = Arc::new(CrossApi::new(
            audit_repo.clone(),
            cross_repo,
            file_repo,
            action_log_repo.clone(),
            runner,
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            cross_api,
            audit_repo,
            action_log_repo,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

// ==========================================
// 默认数据库路径辅助函数
// ==========================================

/// 获取默认数据库路径
///
/// # 返回
/// - 开发环境: 用户数据目录/audit-cross-dev/audit_cross.db
/// - 生产环境: 用户数据目录/audit-cross/audit_cross.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("AUDIT_CROSS_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    // 先给一个默认回退值，后续如果能拿到 data_dir 再覆盖。
    let mut path = PathBuf::from("./audit_cross.db");

    // 尝试获取用户数据目录
    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("audit-cross-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("audit-cross");
        }

        // 确保目录存在
        std::fs::create_dir_all(&path).ok();
        path = path.join("audit_cross.db");
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    // 注意：AppState::new() 的测试需要真实的数据库文件
    // 这些测试在集成测试中进行
}
