// ==========================================
// 审计交叉核对系统 - 操作日志仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
// ==========================================

use crate::domain::ActionLog;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

pub struct ActionLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ActionLogRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 插入操作日志
    pub fn insert(&self, log: &ActionLog) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO action_log (
                action_id, audit_id, action_type, action_ts, actor,
                detail, previous_json, new_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                log.action_id,
                log.audit_id,
                log.action_type,
                log.action_ts.format("%Y-%m-%d %H:%M:%S").to_string(),
                log.actor,
                log.detail,
                log.previous_json.as_ref().map(|v| v.to_string()),
                log.new_json.as_ref().map(|v| v.to_string()),
            ],
        )?;

        Ok(log.action_id.clone())
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 查询指定审计项目的操作日志（最近优先）
    pub fn find_by_audit(&self, audit_id: &str, limit: i32) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT action_id, audit_id, action_type, action_ts, actor,
                   detail, previous_json, new_json
            FROM action_log
            WHERE audit_id = ?1
            ORDER BY action_ts DESC
            LIMIT ?2
            "#,
        )?;

        let logs = stmt
            .query_map(params![audit_id, limit], |row| Self::map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(logs)
    }

    /// 查询指定操作类型的日志（最近优先）
    pub fn find_by_action_type(
        &self,
        action_type: &str,
        limit: i32,
    ) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT action_id, audit_id, action_type, action_ts, actor,
                   detail, previous_json, new_json
            FROM action_log
            WHERE action_type = ?1
            ORDER BY action_ts DESC
            LIMIT ?2
            "#,
        )?;

        let logs = stmt
            .query_map(params![action_type, limit], |row| Self::map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(logs)
    }

    /// 查询最近的 N 条日志
    pub fn find_recent(&self, limit: i32) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT action_id, audit_id, action_type, action_ts, actor,
                   detail, previous_json, new_json
            FROM action_log
            ORDER BY action_ts DESC
            LIMIT ?1
            "#,
        )?;

        let logs = stmt
            .query_map(params![limit], |row| Self::map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(logs)
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    /// 将数据库行映射为 ActionLog 实体
    fn map_row(row: &Row) -> SqliteResult<ActionLog> {
        let action_ts_str: String = row.get(3)?;
        let action_ts = NaiveDateTime::parse_from_str(&action_ts_str, "%Y-%m-%d %H:%M:%S")
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    3,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;

        let previous_json_str: Option<String> = row.get(6)?;
        let new_json_str: Option<String> = row.get(7)?;

        Ok(ActionLog {
            action_id: row.get(0)?,
            audit_id: row.get(1)?,
            action_type: row.get(2)?,
            action_ts,
            actor: row.get(4)?,
            detail: row.get(5)?,
            previous_json: previous_json_str.and_then(|s| serde_json::from_str(&s).ok()),
            new_json: new_json_str.and_then(|s| serde_json::from_str(&s).ok()),
        })
    }
}
