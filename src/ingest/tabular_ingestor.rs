// ==========================================
// 审计交叉核对系统 - 表格摄取适配器
// ==========================================
// 契约: 文件引用 → 保序的数据行表
// 并发: 批量摄取按文件并行（每文件一个阻塞任务），
//       输出顺序与选择顺序一致
// ==========================================

use crate::domain::ProcessedFileDescriptor;
use crate::ingest::blob_store::BlobStore;
use crate::ingest::error::{IngestError, IngestResult};
use crate::ingest::file_parser::{ParsedSheet, UniversalFileParser};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::sync::Arc;

// ==========================================
// ParsedTable - 带来源标识的解析结果
// ==========================================
#[derive(Debug, Clone)]
pub struct ParsedTable {
    pub file_id: String,
    pub display_name: String,  // 聚合与 MatchResult.source_files 使用的文件名
    pub original_name: String, // 上传时的原始文件名
    pub uploaded_at: NaiveDateTime,
    pub sheet: ParsedSheet,
}

impl ParsedTable {
    /// 生成嵌入 CrossExecution 的文件摘要
    pub fn descriptor(&self) -> ProcessedFileDescriptor {
        ProcessedFileDescriptor {
            filename: self.display_name.clone(),
            original_name: self.original_name.clone(),
            record_count: self.sheet.rows.len() as i64,
            upload_date: self.uploaded_at,
        }
    }
}

// ==========================================
// TabularIngestor Trait
// ==========================================
// 用途: 摄取主接口
// 实现者: TabularIngestorImpl
#[async_trait]
pub trait TabularIngestor: Send + Sync {
    /// 摄取单个文件
    ///
    /// # 参数
    /// - file_id: 存储层文件引用
    ///
    /// # 返回
    /// - Ok(ParsedTable): 表头 + 数据行 + 来源标识
    /// - Err(IngestError): 引用未登记、文件不可读、格式不支持、表头为空
    async fn ingest_file(&self, file_id: &str) -> IngestResult<ParsedTable>;

    /// 批量摄取（并发执行）
    ///
    /// # 说明
    /// - 每个文件独立解析，互不影响
    /// - 返回顺序与 file_ids 一致（聚合依赖选择顺序）
    async fn ingest_batch(&self, file_ids: &[String]) -> Vec<IngestResult<ParsedTable>>;
}

// ==========================================
// TabularIngestorImpl
// ==========================================
pub struct TabularIngestorImpl {
    blob_store: Arc<dyn BlobStore>,
}

impl TabularIngestorImpl {
    pub fn new(blob_store: Arc<dyn BlobStore>) -> Self {
        Self { blob_store }
    }
}

#[async_trait]
impl TabularIngestor for TabularIngestorImpl {
    async fn ingest_file(&self, file_id: &str) -> IngestResult<ParsedTable> {
        let meta = self.blob_store.describe(file_id)?;
        let path = self.blob_store.resolve_path(file_id)?;

        tracing::debug!(
            file_id = %file_id,
            path = %path.display(),
            "开始解析文件"
        );

        // 解析为 CPU/IO 密集同步操作，移入阻塞线程池
        let sheet = tokio::task::spawn_blocking(move || UniversalFileParser.parse(path))
            .await
            .map_err(|e| IngestError::InternalError(format!("解析任务失败: {}", e)))??;

        tracing::info!(
            file_id = %file_id,
            filename = %meta.stored_name,
            rows = sheet.rows.len(),
            columns = sheet.headers.len(),
            "文件解析完成"
        );

        Ok(ParsedTable {
            file_id: meta.file_id,
            display_name: meta.stored_name,
            original_name: meta.original_name,
            uploaded_at: meta.uploaded_at,
            sheet,
        })
    }

    async fn ingest_batch(&self, file_ids: &[String]) -> Vec<IngestResult<ParsedTable>> {
        // join_all 保持输入顺序，内部任务并行执行
        futures::future::join_all(file_ids.iter().map(|id| self.ingest_file(id))).await
    }
}
