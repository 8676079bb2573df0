// ==========================================
// 审计交叉核对系统 - 执行编排器
// ==========================================
// 流程: 并行摄取 → 顺序聚合 → 分类 → 结论
// 运行边界: 受管执行内的摄取/聚合/分类错误不向外传播，
//           转为 status=Error + error_details 的可查询记录
// ==========================================

use crate::domain::{
    CrossStatus, ErrorDetails, ExecutionDetails, MatchResult, ProcessedFileDescriptor,
};
use crate::engine::aggregator::KeyOccurrenceAggregator;
use crate::engine::classifier::MatchClassifier;
use crate::engine::error::EngineResult;
use crate::ingest::{ParsedTable, TabularIngestor};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

// ==========================================
// CrossRequest - 单次执行的配置
// ==========================================
#[derive(Debug, Clone)]
pub struct CrossRequest {
    pub audit_id: String,
    pub key_field: String,
    pub result_field: String,
    pub file_ids: Vec<String>, // 选择顺序即合并顺序
    pub executed_by: String,
}

// ==========================================
// CrossOutcome - 运行边界内的执行结果
// ==========================================
// status 只会是 Completed 或 Error（同步实现不暴露 InProgress）
#[derive(Debug, Clone)]
pub struct CrossOutcome {
    pub processed_files: Vec<ProcessedFileDescriptor>,
    pub results: Vec<MatchResult>,
    pub status: CrossStatus,
    pub error_details: Option<ErrorDetails>,
    pub execution_details: ExecutionDetails,
}

// ==========================================
// CrossExecutor Trait
// ==========================================
// 用途: 执行编排主接口
// 实现者: CrossRunner
#[async_trait]
pub trait CrossExecutor: Send + Sync {
    /// 执行一次交叉核对
    ///
    /// # 说明
    /// - 永不返回 Err: 执行中的错误被运行边界捕获，
    ///   以 status=Error 的结论返回，由调用方照常落库
    async fn run(&self, request: &CrossRequest) -> CrossOutcome;
}

// ==========================================
// CrossRunner
// ==========================================
pub struct CrossRunner {
    ingestor: Arc<dyn TabularIngestor>,
}

impl CrossRunner {
    pub fn new(ingestor: Arc<dyn TabularIngestor>) -> Self {
        Self { ingestor }
    }

    /// 摄取 + 聚合 + 分类（错误在此链路内向上冒泡）
    async fn run_inner(
        &self,
        request: &CrossRequest,
    ) -> EngineResult<(Vec<ProcessedFileDescriptor>, Vec<MatchResult>)> {
        // 阶段 1: 并行摄取（输出顺序与选择顺序一致）
        let mut tables: Vec<ParsedTable> = Vec::with_capacity(request.file_ids.len());
        for parsed in self.ingestor.ingest_batch(&request.file_ids).await {
            tables.push(parsed?);
        }

        let processed_files = tables.iter().map(|t| t.descriptor()).collect();

        // 阶段 2: 顺序聚合
        let aggregator = KeyOccurrenceAggregator::new(
            request.key_field.clone(),
            request.result_field.clone(),
        );
        let aggregation = aggregator.aggregate(&tables)?;

        // 阶段 3: 分类
        let results = MatchClassifier::classify(aggregation);

        Ok((processed_files, results))
    }
}

#[async_trait]
impl CrossExecutor for CrossRunner {
    async fn run(&self, request: &CrossRequest) -> CrossOutcome {
        let started_at = chrono::Utc::now().naive_utc();
        let timer = Instant::now();

        tracing::info!(
            audit_id = %request.audit_id,
            key_field = %request.key_field,
            result_field = %request.result_field,
            files = request.file_ids.len(),
            "开始交叉核对"
        );

        let inner = self.run_inner(request).await;

        let finished_at = chrono::Utc::now().naive_utc();
        let execution_details = ExecutionDetails {
            started_at,
            finished_at,
            duration_ms: timer.elapsed().as_millis() as i64,
            executed_by: request.executed_by.clone(),
        };

        match inner {
            Ok((processed_files, results)) => {
                tracing::info!(
                    audit_id = %request.audit_id,
                    distinct_keys = results.len(),
                    duration_ms = execution_details.duration_ms,
                    "交叉核对完成"
                );

                CrossOutcome {
                    processed_files,
                    results,
                    status: CrossStatus::Completed,
                    error_details: None,
                    execution_details,
                }
            }
            Err(e) => {
                let chain = anyhow::Error::from(e);
                tracing::error!(
                    audit_id = %request.audit_id,
                    error = %chain,
                    "交叉核对执行失败"
                );

                CrossOutcome {
                    processed_files: Vec::new(),
                    results: Vec::new(),
                    status: CrossStatus::Error,
                    error_details: Some(ErrorDetails {
                        message: chain.to_string(),
                        stack: format!("{:#}", chain),
                        timestamp: finished_at,
                    }),
                    execution_details,
                }
            }
        }
    }
}
