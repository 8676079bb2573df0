// ==========================================
// 审计交叉核对系统 - 上传文件登记仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
// 注意: 使用痕迹（use_count/last_used_at/record_count）的更新
//       在 cross_execution 落库事务内完成（见 CrossExecutionRepository）
// ==========================================

use crate::domain::FileRecord;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

pub struct FileRecordRepository {
    conn: Arc<Mutex<Connection>>,
}

impl FileRecordRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 登记上传文件
    pub fn insert(&self, record: &FileRecord) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO file_record (
                file_id, audit_id, original_name, stored_name, storage_path,
                record_count, uploaded_at, uploaded_by, use_count, last_used_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                record.file_id,
                record.audit_id,
                record.original_name,
                record.stored_name,
                record.storage_path,
                record.record_count,
                record.uploaded_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                record.uploaded_by,
                record.use_count,
                record
                    .last_used_at
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
            ],
        )?;

        Ok(record.file_id.clone())
    }

    /// 按 file_id 查询登记项
    pub fn find_by_id(&self, file_id: &str) -> RepositoryResult<Option<FileRecord>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT file_id, audit_id, original_name, stored_name, storage_path,
                   record_count, uploaded_at, uploaded_by, use_count, last_used_at
            FROM file_record
            WHERE file_id = ?1
            "#,
        )?;

        match stmt.query_row(params![file_id], |row| Self::map_row(row)) {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询审计项目的全部登记文件
    pub fn find_by_audit(&self, audit_id: &str) -> RepositoryResult<Vec<FileRecord>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT file_id, audit_id, original_name, stored_name, storage_path,
                   record_count, uploaded_at, uploaded_by, use_count, last_used_at
            FROM file_record
            WHERE audit_id = ?1
            ORDER BY uploaded_at DESC
            "#,
        )?;

        let records = stmt
            .query_map(params![audit_id], |row| Self::map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(records)
    }

    /// 将数据库行映射为 FileRecord 实体
    fn map_row(row: &Row) -> SqliteResult<FileRecord> {
        let uploaded_at_str: String = row.get(6)?;
        let uploaded_at = NaiveDateTime::parse_from_str(&uploaded_at_str, "%Y-%m-%d %H:%M:%S")
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    6,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;

        let last_used_at_str: Option<String> = row.get(9)?;
        let last_used_at = last_used_at_str
            .and_then(|s| NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S").ok());

        Ok(FileRecord {
            file_id: row.get(0)?,
            audit_id: row.get(1)?,
            original_name: row.get(2)?,
            stored_name: row.get(3)?,
            storage_path: row.get(4)?,
            record_count: row.get(5)?,
            uploaded_at,
            uploaded_by: row.get(7)?,
            use_count: row.get(8)?,
            last_used_at,
        })
    }
}
