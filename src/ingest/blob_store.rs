// ==========================================
// 审计交叉核对系统 - Blob 存储接口
// ==========================================
// 文件字节由存储服务托管；引擎通过引用访问，
// 自身从不管理字节内容
// ==========================================

use crate::ingest::error::{IngestError, IngestResult};
use crate::repository::file_record_repo::FileRecordRepository;
use chrono::NaiveDateTime;
use std::path::PathBuf;
use std::sync::Arc;

// ==========================================
// FileMeta - 存储层文件描述
// ==========================================
#[derive(Debug, Clone)]
pub struct FileMeta {
    pub file_id: String,
    pub original_name: String,
    pub stored_name: String,
    pub uploaded_at: NaiveDateTime,
}

// ==========================================
// BlobStore Trait
// ==========================================
// 用途: 存储服务接口（describe + 路径解析）
// 实现者: LocalBlobStore
pub trait BlobStore: Send + Sync {
    /// 查询文件描述信息
    fn describe(&self, file_id: &str) -> IngestResult<FileMeta>;

    /// 解析文件引用为本地可读路径
    fn resolve_path(&self, file_id: &str) -> IngestResult<PathBuf>;
}

// ==========================================
// LocalBlobStore - 本地磁盘存储
// ==========================================
// 以 file_record 登记表为目录，文件字节在本地磁盘
pub struct LocalBlobStore {
    file_repo: Arc<FileRecordRepository>,
}

impl LocalBlobStore {
    pub fn new(file_repo: Arc<FileRecordRepository>) -> Self {
        Self { file_repo }
    }
}

impl BlobStore for LocalBlobStore {
    fn describe(&self, file_id: &str) -> IngestResult<FileMeta> {
        let record = self
            .file_repo
            .find_by_id(file_id)
            .map_err(|e| IngestError::InternalError(e.to_string()))?
            .ok_or_else(|| IngestError::FileNotRegistered(file_id.to_string()))?;

        Ok(FileMeta {
            file_id: record.file_id,
            original_name: record.original_name,
            stored_name: record.stored_name,
            uploaded_at: record.uploaded_at,
        })
    }

    fn resolve_path(&self, file_id: &str) -> IngestResult<PathBuf> {
        let record = self
            .file_repo
            .find_by_id(file_id)
            .map_err(|e| IngestError::InternalError(e.to_string()))?
            .ok_or_else(|| IngestError::FileNotRegistered(file_id.to_string()))?;

        Ok(PathBuf::from(record.storage_path))
    }
}
