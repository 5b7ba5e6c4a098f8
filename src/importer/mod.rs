// ==========================================
// 配方成本核算系统 - 导入层
// ==========================================
// 职责: 外部价格表导入，生成价格库条目
// 支持: Excel (.xlsx), CSV, 远程地址
// ==========================================

// 模块声明
pub mod data_cleaner;
pub mod error;
pub mod file_parser;
pub mod price_importer;
pub mod price_importer_trait;
pub mod price_validator;

// 重导出核心类型
pub use data_cleaner::DataCleaner as DataCleanerImpl;
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use price_importer::PriceImporterImpl;
pub use price_validator::ImportValidator;

// 重导出 Trait 接口
pub use price_importer_trait::{DataCleaner, FileParser, PriceImportOutcome, PriceImporter};
