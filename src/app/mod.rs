// ==========================================
// 审计交叉核对系统 - 应用层
// ==========================================
// 职责: 装配共享状态，供二进制入口使用
// ==========================================

pub mod state;

pub use state::{get_default_db_path, AppState};
