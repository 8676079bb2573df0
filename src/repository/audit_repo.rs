// ==========================================
// 审计交叉核对系统 - 审计项目目录仓储
// ==========================================
// 协作方视图: 引擎只消费 exists/lookup，insert 供种子数据使用
// 红线: Repository 不做业务逻辑,只做数据映射
// ==========================================

use crate::domain::AuditRecord;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

pub struct AuditRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AuditRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 审计项目是否存在（按规范化 audit_id）
    pub fn exists(&self, audit_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM audit WHERE audit_id = ?1",
            params![audit_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// 按 audit_id 查询单个审计项目
    pub fn find_by_id(&self, audit_id: &str) -> RepositoryResult<Option<AuditRecord>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT audit_id, audit_code, audit_name, client_name, status, created_at
            FROM audit
            WHERE audit_id = ?1
            "#,
        )?;

        match stmt.query_row(params![audit_id], |row| Self::map_row(row)) {
            Ok(audit) => Ok(Some(audit)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 插入审计项目（种子/测试用）
    pub fn insert(&self, audit: &AuditRecord) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO audit (audit_id, audit_code, audit_name, client_name, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                audit.audit_id,
                audit.audit_code,
                audit.audit_name,
                audit.client_name,
                audit.status,
                audit.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )?;

        Ok(audit.audit_id.clone())
    }

    /// 将数据库行映射为 AuditRecord 实体
    fn map_row(row: &Row) -> SqliteResult<AuditRecord> {
        let created_at_str: String = row.get(5)?;
        let created_at = NaiveDateTime::parse_from_str(&created_at_str, "%Y-%m-%d %H:%M:%S")
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    5,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;

        Ok(AuditRecord {
            audit_id: row.get(0)?,
            audit_code: row.get(1)?,
            audit_name: row.get(2)?,
            client_name: row.get(3)?,
            status: row.get(4)?,
            created_at,
        })
    }
}
