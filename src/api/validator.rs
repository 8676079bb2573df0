// ==========================================
// 审计交叉核对系统 - 执行请求校验器
// ==========================================
// 职责: 执行开始前的请求校验
// 约定: 校验失败直接作为请求失败返回，不产生任何落库记录
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::engine::CrossRequest;
use std::collections::HashSet;

/// 执行一次交叉核对所需的最少文件数
pub const MIN_FILES_PER_CROSS: usize = 2;

pub struct CrossRequestValidator;

impl CrossRequestValidator {
    /// 校验执行请求
    ///
    /// # 规则
    /// - 至少选择两个文件（单文件无从交叉）
    /// - 文件引用不允许重复（同一文件与自身必然全命中）
    /// - key_field / result_field / executed_by 非空
    pub fn validate_execute(request: &CrossRequest) -> ApiResult<()> {
        if request.key_field.trim().is_empty() {
            return Err(ApiError::ValidationError("未指定键列".to_string()));
        }

        if request.result_field.trim().is_empty() {
            return Err(ApiError::ValidationError("未指定报告列".to_string()));
        }

        if request.executed_by.trim().is_empty() {
            return Err(ApiError::ValidationError("未指定操作人".to_string()));
        }

        if request.file_ids.len() < MIN_FILES_PER_CROSS {
            return Err(ApiError::ValidationError(format!(
                "至少需要{}个文件，实际{}个",
                MIN_FILES_PER_CROSS,
                request.file_ids.len()
            )));
        }

        let mut seen = HashSet::new();
        for file_id in &request.file_ids {
            if !seen.insert(file_id.as_str()) {
                return Err(ApiError::ValidationError(format!(
                    "文件引用重复: {}",
                    file_id
                )));
            }
        }

        Ok(())
    }
}
