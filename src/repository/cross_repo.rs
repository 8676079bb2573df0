// ==========================================
// 审计交叉核对系统 - 交叉核对仓储
// ==========================================
// 集合: cross_execution（按 audit_id / cross_id / status 建索引）
// 原子性: 一次执行的落库（含文件使用痕迹）是单事务，
//         读方永远看不到半写入的执行记录
// 读路径: audit_id 写入时已规范化，查询使用精确相等
// ==========================================

use crate::domain::{
    CrossExecution, CrossExecutionPatch, CrossStats, CrossStatus, ErrorDetails, ExecutionDetails,
    MatchResult, NewCrossExecution, ProcessedFileDescriptor, Summary,
};
use crate::engine::SummaryCalculator;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

const TS_FMT: &str = "%Y-%m-%d %H:%M:%S";

pub struct CrossExecutionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CrossExecutionRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 生成 cross_id: 时间戳 + 随机段
    fn generate_cross_id(now: NaiveDateTime) -> String {
        let random_part = Uuid::new_v4().simple().to_string();
        format!(
            "CR{}{}",
            now.format("%Y%m%d%H%M%S"),
            &random_part[..8].to_uppercase()
        )
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 持久化一次执行（单事务）
    ///
    /// # 说明
    /// - summary 由 results 服务端重算，不接受外部值
    /// - 同事务内更新来源文件的使用痕迹（use_count/last_used_at/record_count）
    /// - 审计引用的存在性由调用方在执行前校验
    ///
    /// # 返回
    /// - Ok(CrossExecution): 含新分配 cross_id 的完整记录
    /// - Err(ValidationError): 必填字段缺失
    pub fn create(&self, new: NewCrossExecution) -> RepositoryResult<CrossExecution> {
        Self::validate_required(&new)?;

        let summary = SummaryCalculator::calculate(&new.results);
        let now = chrono::Utc::now().naive_utc();
        let cross_id = Self::generate_cross_id(now);

        let processed_files_json = serde_json::to_string(&new.processed_files)?;
        let results_json = serde_json::to_string(&new.results)?;
        let error_json = new
            .error_details
            .as_ref()
            .map(|e| serde_json::to_string(e))
            .transpose()?;

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO cross_execution (
                cross_id, audit_id, key_field, result_field,
                processed_files_json, results_json,
                total_records, matching_records, non_matching_records, match_percentage,
                status, error_json,
                started_at, finished_at, duration_ms, executed_by,
                revision, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
            "#,
            params![
                cross_id,
                new.audit_id,
                new.key_field,
                new.result_field,
                processed_files_json,
                results_json,
                summary.total_records,
                summary.matching_records,
                summary.non_matching_records,
                summary.match_percentage,
                new.status.as_str(),
                error_json,
                new.execution_details.started_at.format(TS_FMT).to_string(),
                new.execution_details.finished_at.format(TS_FMT).to_string(),
                new.execution_details.duration_ms,
                new.execution_details.executed_by,
                0i64,
                now.format(TS_FMT).to_string(),
            ],
        )?;

        // 文件使用痕迹与执行记录同事务提交（不存在半写入状态）
        for (file_id, descriptor) in new.source_file_ids.iter().zip(new.processed_files.iter()) {
            tx.execute(
                r#"
                UPDATE file_record
                SET use_count = use_count + 1,
                    last_used_at = ?1,
                    record_count = ?2
                WHERE file_id = ?3
                "#,
                params![
                    now.format(TS_FMT).to_string(),
                    descriptor.record_count,
                    file_id,
                ],
            )?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tracing::info!(
            cross_id = %cross_id,
            audit_id = %new.audit_id,
            status = %new.status,
            total_records = summary.total_records,
            "执行记录已落库"
        );

        Ok(CrossExecution {
            cross_id,
            audit_id: new.audit_id,
            key_field: new.key_field,
            result_field: new.result_field,
            processed_files: new.processed_files,
            results: new.results,
            summary,
            execution_details: new.execution_details,
            status: new.status,
            error_details: new.error_details,
            revision: 0,
        })
    }

    /// 部分更新
    ///
    /// # 规则
    /// - results 被更新时重算 summary（服务端派生）
    /// - 不允许把状态改回 IN_PROGRESS（终态只能在终态间人工修正）
    /// - expected_revision 提供时做乐观锁比较，失配返回 VersionConflict
    pub fn update(
        &self,
        cross_id: &str,
        patch: &CrossExecutionPatch,
        expected_revision: Option<i64>,
    ) -> RepositoryResult<CrossExecution> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut existing = {
            let mut stmt = tx.prepare(SELECT_COLUMNS_WHERE_ID)?;
            match stmt.query_row(params![cross_id], |row| Self::map_row(row)) {
                Ok(execution) => execution,
                Err(rusqlite::Error::QueryReturnedNoRows) => {
                    return Err(RepositoryError::NotFound {
                        entity: "CrossExecution".to_string(),
                        id: cross_id.to_string(),
                    })
                }
                Err(e) => return Err(e.into()),
            }
        };

        // 终态只能在终态间人工修正，禁止改回 IN_PROGRESS
        if patch.status == Some(CrossStatus::InProgress) {
            return Err(RepositoryError::InvalidStateTransition {
                from: existing.status.as_str().to_string(),
                to: CrossStatus::InProgress.as_str().to_string(),
            });
        }

        if let Some(expected) = expected_revision {
            if expected != existing.revision {
                return Err(RepositoryError::VersionConflict {
                    cross_id: cross_id.to_string(),
                    expected,
                    actual: existing.revision,
                });
            }
        }

        // 应用补丁
        if let Some(key_field) = &patch.key_field {
            existing.key_field = key_field.clone();
        }
        if let Some(result_field) = &patch.result_field {
            existing.result_field = result_field.clone();
        }
        if let Some(results) = &patch.results {
            existing.results = results.clone();
            existing.summary = SummaryCalculator::calculate(&existing.results);
        }
        if let Some(status) = patch.status {
            existing.status = status;
        }
        existing.revision += 1;

        let results_json = serde_json::to_string(&existing.results)?;

        tx.execute(
            r#"
            UPDATE cross_execution
            SET key_field = ?1,
                result_field = ?2,
                results_json = ?3,
                total_records = ?4,
                matching_records = ?5,
                non_matching_records = ?6,
                match_percentage = ?7,
                status = ?8,
                revision = ?9
            WHERE cross_id = ?10
            "#,
            params![
                existing.key_field,
                existing.result_field,
                results_json,
                existing.summary.total_records,
                existing.summary.matching_records,
                existing.summary.non_matching_records,
                existing.summary.match_percentage,
                existing.status.as_str(),
                existing.revision,
                cross_id,
            ],
        )?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tracing::info!(
            cross_id = %cross_id,
            revision = existing.revision,
            "执行记录已更新"
        );

        Ok(existing)
    }

    /// 删除执行记录
    ///
    /// # 返回
    /// - Ok(CrossExecution): 被删除的完整记录（供调用方记录操作日志）
    /// - Err(NotFound): cross_id 不存在
    pub fn delete(&self, cross_id: &str) -> RepositoryResult<CrossExecution> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let existing = {
            let mut stmt = tx.prepare(SELECT_COLUMNS_WHERE_ID)?;
            match stmt.query_row(params![cross_id], |row| Self::map_row(row)) {
                Ok(execution) => execution,
                Err(rusqlite::Error::QueryReturnedNoRows) => {
                    return Err(RepositoryError::NotFound {
                        entity: "CrossExecution".to_string(),
                        id: cross_id.to_string(),
                    })
                }
                Err(e) => return Err(e.into()),
            }
        };

        tx.execute(
            "DELETE FROM cross_execution WHERE cross_id = ?1",
            params![cross_id],
        )?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tracing::info!(
            cross_id = %cross_id,
            audit_id = %existing.audit_id,
            removed_results = existing.result_count(),
            "执行记录已删除"
        );

        Ok(existing)
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 cross_id 查询完整执行记录
    pub fn find_by_id(&self, cross_id: &str) -> RepositoryResult<Option<CrossExecution>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(SELECT_COLUMNS_WHERE_ID)?;

        match stmt.query_row(params![cross_id], |row| Self::map_row(row)) {
            Ok(execution) => Ok(Some(execution)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询审计项目的执行记录（最近优先，分页）
    pub fn find_by_audit(
        &self,
        audit_id: &str,
        limit: i32,
        offset: i32,
    ) -> RepositoryResult<Vec<CrossExecution>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT cross_id, audit_id, key_field, result_field,
                   processed_files_json, results_json,
                   total_records, matching_records, non_matching_records, match_percentage,
                   status, error_json,
                   started_at, finished_at, duration_ms, executed_by, revision
            FROM cross_execution
            WHERE audit_id = ?1
            ORDER BY started_at DESC
            LIMIT ?2
            OFFSET ?3
            "#,
        )?;

        let executions = stmt
            .query_map(params![audit_id, limit, offset], |row| Self::map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(executions)
    }

    /// 统计审计项目的执行总数（配合分页）
    pub fn count_by_audit(&self, audit_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM cross_execution WHERE audit_id = ?1",
            params![audit_id],
            |row| row.get(0),
        )?;

        Ok(count)
    }

    /// 按审计项目聚合统计
    ///
    /// # 说明
    /// 无任何执行记录时返回零值结构，不是错误
    pub fn stats(&self, audit_id: &str) -> RepositoryResult<CrossStats> {
        let conn = self.get_conn()?;

        let stats = conn.query_row(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(total_records), 0),
                   COALESCE(SUM(matching_records), 0),
                   COALESCE(AVG(match_percentage), 0.0),
                   MAX(started_at)
            FROM cross_execution
            WHERE audit_id = ?1
            "#,
            params![audit_id],
            |row| {
                let last_execution_str: Option<String> = row.get(4)?;
                Ok(CrossStats {
                    total_crosses: row.get(0)?,
                    total_records: row.get(1)?,
                    total_matches: row.get(2)?,
                    avg_match_percentage: row.get(3)?,
                    last_execution: last_execution_str
                        .and_then(|s| NaiveDateTime::parse_from_str(&s, TS_FMT).ok()),
                })
            },
        )?;

        Ok(stats)
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    fn validate_required(new: &NewCrossExecution) -> RepositoryResult<()> {
        if new.audit_id.trim().is_empty() {
            return Err(RepositoryError::ValidationError(
                "audit_id 不能为空".to_string(),
            ));
        }
        if new.key_field.trim().is_empty() {
            return Err(RepositoryError::ValidationError(
                "key_field 不能为空".to_string(),
            ));
        }
        if new.result_field.trim().is_empty() {
            return Err(RepositoryError::ValidationError(
                "result_field 不能为空".to_string(),
            ));
        }
        if new.execution_details.executed_by.trim().is_empty() {
            return Err(RepositoryError::ValidationError(
                "executed_by 不能为空".to_string(),
            ));
        }
        Ok(())
    }

    /// 将数据库行映射为 CrossExecution 实体
    fn map_row(row: &Row) -> SqliteResult<CrossExecution> {
        fn json_col<T: serde::de::DeserializeOwned>(idx: usize, s: &str) -> SqliteResult<T> {
            serde_json::from_str(s).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    idx,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })
        }

        fn ts_col(idx: usize, s: &str) -> SqliteResult<NaiveDateTime> {
            NaiveDateTime::parse_from_str(s, TS_FMT).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    idx,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })
        }

        let processed_files_str: String = row.get(4)?;
        let results_str: String = row.get(5)?;
        let status_str: String = row.get(10)?;
        let error_str: Option<String> = row.get(11)?;
        let started_at_str: String = row.get(12)?;
        let finished_at_str: String = row.get(13)?;

        let processed_files: Vec<ProcessedFileDescriptor> = json_col(4, &processed_files_str)?;
        let results: Vec<MatchResult> = json_col(5, &results_str)?;

        let status = CrossStatus::from_str(&status_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                10,
                rusqlite::types::Type::Text,
                Box::new(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("未知执行状态: {}", status_str),
                )),
            )
        })?;

        let error_details: Option<ErrorDetails> = match error_str {
            Some(s) => Some(json_col(11, &s)?),
            None => None,
        };

        Ok(CrossExecution {
            cross_id: row.get(0)?,
            audit_id: row.get(1)?,
            key_field: row.get(2)?,
            result_field: row.get(3)?,
            processed_files,
            results,
            summary: Summary {
                total_records: row.get(6)?,
                matching_records: row.get(7)?,
                non_matching_records: row.get(8)?,
                match_percentage: row.get(9)?,
            },
            status,
            error_details,
            execution_details: ExecutionDetails {
                started_at: ts_col(12, &started_at_str)?,
                finished_at: ts_col(13, &finished_at_str)?,
                duration_ms: row.get(14)?,
                executed_by: row.get(15)?,
            },
            revision: row.get(16)?,
        })
    }
}

const SELECT_COLUMNS_WHERE_ID: &str = r#"
    SELECT cross_id, audit_id, key_field, result_field,
           processed_files_json, results_json,
           total_records, matching_records, non_matching_records, match_percentage,
           status, error_json,
           started_at, finished_at, duration_ms, executed_by, revision
    FROM cross_execution
    WHERE cross_id = ?1
"#;
