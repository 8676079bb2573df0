// ==========================================
// 审计交叉核对系统 - 摄取层
// ==========================================
// 职责: 外部表格文件 → 内部数据行
// 支持: Excel, CSV
// ==========================================

// 模块声明
pub mod blob_store;
pub mod error;
pub mod file_parser;
pub mod tabular_ingestor;

// 重导出核心类型
pub use blob_store::{BlobStore, FileMeta, LocalBlobStore};
pub use error::{IngestError, IngestResult};
pub use file_parser::{CsvParser, ExcelParser, FileParser, ParsedSheet, RawRecord, UniversalFileParser};
pub use tabular_ingestor::{ParsedTable, TabularIngestor, TabularIngestorImpl};
