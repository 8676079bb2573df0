// ==========================================
// 审计交叉核对系统 - 交叉核对API
// ==========================================
// 职责: 封装交叉核对的请求面
//       execute / list / detail / update / delete / stats
// 约定: 请求校验与审计引用检查发生在执行之前（失败不落库）；
//       执行中的错误由运行边界转为 Error 记录照常落库
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::CrossRequestValidator;
use crate::domain::{
    ActionLog, ActionType, CrossExecution, CrossExecutionPatch, CrossStats, FileRecord,
    NewCrossExecution,
};
use crate::engine::{CrossExecutor, CrossRequest};
use crate::repository::{
    ActionLogRepository, AuditRepository, CrossExecutionRepository, FileRecordRepository,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

// ==========================================
// 响应 DTO
// ==========================================

/// 执行记录列表响应（带分页信息）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossListResponse {
    pub executions: Vec<CrossExecution>,
    pub total: i64,
    pub limit: i32,
    pub offset: i32,
}

/// 删除执行记录响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteCrossResponse {
    pub cross_id: String,
    pub removed_results: i64,
    pub message: String,
}

// ==========================================
// CrossApi
// ==========================================
pub struct CrossApi {
    audit_repo: Arc<AuditRepository>,
    cross_repo: Arc<CrossExecutionRepository>,
    file_repo: Arc<FileRecordRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    runner: Arc<dyn CrossExecutor>,
}

impl CrossApi {
    pub fn new(
        audit_repo: Arc<AuditRepository>,
        cross_repo: Arc<CrossExecutionRepository>,
        file_repo: Arc<FileRecordRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        runner: Arc<dyn CrossExecutor>,
    ) -> Self {
        Self {
            audit_repo,
            cross_repo,
            file_repo,
            action_log_repo,
            runner,
        }
    }

    /// 执行一次交叉核对并落库
    ///
    /// # 参数
    /// - request: 审计引用 + 键列/报告列 + 文件引用列表（选择顺序）
    ///
    /// # 返回
    /// - Ok(CrossExecution): 终态记录（Completed 或 Error 均照常落库）
    /// - Err(ValidationError): 文件数不足/键列缺失等（执行前失败，不落库）
    /// - Err(AuditNotFound): 审计引用不存在（执行前失败，不落库）
    pub async fn execute_cross(&self, request: CrossRequest) -> ApiResult<CrossExecution> {
        // 1. 请求校验（执行前）
        CrossRequestValidator::validate_execute(&request)?;

        // 2. 审计引用检查（执行前）
        if !self.audit_repo.exists(&request.audit_id)? {
            return Err(ApiError::AuditNotFound(request.audit_id.clone()));
        }

        // 3. 受管执行（运行边界内错误转为 Error 结论）
        let outcome = self.runner.run(&request).await;

        // 4. 落库（summary 服务端重算；文件使用痕迹同事务）
        let execution = self.cross_repo.create(NewCrossExecution {
            audit_id: request.audit_id.clone(),
            key_field: request.key_field.clone(),
            result_field: request.result_field.clone(),
            source_file_ids: request.file_ids.clone(),
            processed_files: outcome.processed_files,
            results: outcome.results,
            execution_details: outcome.execution_details,
            status: outcome.status,
            error_details: outcome.error_details,
        })?;

        // 5. 操作日志（失败仅告警，不回滚已落库的执行记录）
        let log = ActionLog::new(
            Some(execution.audit_id.clone()),
            ActionType::CrossExecute,
            execution.execution_details.executed_by.clone(),
        )
        .with_detail(format!(
            "key_field={}, result_field={}, files={}",
            execution.key_field,
            execution.result_field,
            execution.processed_files.len()
        ))
        .with_new(&json!({
            "cross_id": execution.cross_id,
            "status": execution.status,
            "summary": execution.summary,
        }));
        if let Err(e) = self.action_log_repo.insert(&log) {
            tracing::warn!(cross_id = %execution.cross_id, error = %e, "执行操作日志写入失败");
        }

        Ok(execution)
    }

    /// 查询审计项目的执行记录（最近优先，分页）
    pub async fn list_crosses(
        &self,
        audit_id: &str,
        limit: i32,
        offset: i32,
    ) -> ApiResult<CrossListResponse> {
        // 参数限幅
        let limit = limit.max(1).min(100);
        let offset = offset.max(0);

        let executions = self.cross_repo.find_by_audit(audit_id, limit, offset)?;
        let total = self.cross_repo.count_by_audit(audit_id)?;

        Ok(CrossListResponse {
            executions,
            total,
            limit,
            offset,
        })
    }

    /// 查询单条执行记录详情
    pub async fn get_cross_detail(&self, cross_id: &str) -> ApiResult<CrossExecution> {
        self.cross_repo
            .find_by_id(cross_id)?
            .ok_or_else(|| ApiError::NotFound(format!("CrossExecution(id={})不存在", cross_id)))
    }

    /// 人工修正执行记录（部分更新）
    ///
    /// # 说明
    /// - results 被更新时 summary 服务端重算
    /// - 不允许改回 IN_PROGRESS
    /// - expected_revision 提供时按乐观锁校验
    pub async fn update_cross(
        &self,
        cross_id: &str,
        patch: CrossExecutionPatch,
        expected_revision: Option<i64>,
        actor: &str,
    ) -> ApiResult<CrossExecution> {
        if patch.is_empty() {
            return Err(ApiError::ValidationError(
                "没有任何待更新字段".to_string(),
            ));
        }

        let previous = self.get_cross_detail(cross_id).await?;
        let updated = self.cross_repo.update(cross_id, &patch, expected_revision)?;

        let log = ActionLog::new(
            Some(updated.audit_id.clone()),
            ActionType::CrossUpdate,
            actor.to_string(),
        )
        .with_detail(format!("cross_id={}", cross_id))
        .with_previous(&json!({
            "status": previous.status,
            "summary": previous.summary,
            "revision": previous.revision,
        }))
        .with_new(&json!({
            "status": updated.status,
            "summary": updated.summary,
            "revision": updated.revision,
        }));
        if let Err(e) = self.action_log_repo.insert(&log) {
            tracing::warn!(cross_id = %cross_id, error = %e, "更新操作日志写入失败");
        }

        Ok(updated)
    }

    /// 删除执行记录
    ///
    /// # 说明
    /// 删除为显式终结操作: 向操作日志上报
    /// cross_id / key_field / result_field / 删除的结果条数；
    /// 不级联删除来源文件
    pub async fn delete_cross(&self, cross_id: &str, actor: &str) -> ApiResult<DeleteCrossResponse> {
        let removed = self.cross_repo.delete(cross_id)?;
        let removed_results = removed.result_count();

        let log = ActionLog::new(
            Some(removed.audit_id.clone()),
            ActionType::CrossDelete,
            actor.to_string(),
        )
        .with_detail(format!(
            "cross_id={}, key_field={}, result_field={}, removed_results={}",
            removed.cross_id, removed.key_field, removed.result_field, removed_results
        ))
        .with_previous(&json!({
            "status": removed.status,
            "summary": removed.summary,
        }))
        .with_new(&json!({
            "cross_id": removed.cross_id,
            "key_field": removed.key_field,
            "result_field": removed.result_field,
            "removed_results": removed_results,
        }));
        if let Err(e) = self.action_log_repo.insert(&log) {
            tracing::warn!(cross_id = %cross_id, error = %e, "删除操作日志写入失败");
        }

        Ok(DeleteCrossResponse {
            cross_id: removed.cross_id,
            removed_results,
            message: crate::i18n::t("cross.deleted"),
        })
    }

    /// 查询审计项目的聚合统计
    ///
    /// # 说明
    /// 无任何执行记录时返回零值结构
    pub async fn get_cross_stats(&self, audit_id: &str) -> ApiResult<CrossStats> {
        Ok(self.cross_repo.stats(audit_id)?)
    }

    /// 登记本地文件到 Blob 存储目录
    ///
    /// # 说明
    /// 文件字节不做搬运，只登记引用与元信息；
    /// 供 CLI / 测试为执行准备输入
    pub async fn register_file(
        &self,
        audit_id: &str,
        local_path: &str,
        uploaded_by: &str,
    ) -> ApiResult<FileRecord> {
        if !self.audit_repo.exists(audit_id)? {
            return Err(ApiError::AuditNotFound(audit_id.to_string()));
        }

        let path = Path::new(local_path);
        if !path.exists() {
            return Err(ApiError::ValidationError(format!(
                "文件不存在: {}",
                local_path
            )));
        }

        let stored_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| ApiError::ValidationError(format!("无效文件路径: {}", local_path)))?;

        let record = FileRecord::new(
            format!("FILE-{}", uuid::Uuid::new_v4()),
            audit_id.to_string(),
            stored_name.clone(),
            stored_name,
            path.to_string_lossy().to_string(),
        )
        .with_uploader(uploaded_by.to_string());

        self.file_repo.insert(&record)?;

        let log = ActionLog::new(
            Some(audit_id.to_string()),
            ActionType::FileRegister,
            uploaded_by.to_string(),
        )
        .with_detail(format!("file_id={}, name={}", record.file_id, record.original_name));
        if let Err(e) = self.action_log_repo.insert(&log) {
            tracing::warn!(file_id = %record.file_id, error = %e, "文件登记日志写入失败");
        }

        Ok(record)
    }
}
