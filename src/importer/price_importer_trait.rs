// ==========================================
// 配方成本核算系统 - 价格导入 Trait
// ==========================================
// 职责: 定义价格导入接口（不包含实现）
// 流程: 读取行 → 清洗 → 校验 → 落库
// ==========================================

use crate::domain::catalog::PriceDatabase;
use crate::domain::import::{ImportValidationResult, RawRow};
use crate::importer::error::ImportResult;
use async_trait::async_trait;
use serde::Serialize;
use rust_decimal::Decimal;
use std::path::Path;

// ==========================================
// PriceImportOutcome - 导入结果
// ==========================================
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceImportOutcome {
    pub batch_id: String,
    pub validation: ImportValidationResult,
    /// 仅在校验通过并落库后为 Some
    pub database: Option<PriceDatabase>,
}

impl PriceImportOutcome {
    pub fn is_persisted(&self) -> bool {
        self.database.is_some()
    }
}

// ==========================================
// PriceImporter Trait
// ==========================================
// 用途: 价格导入主接口
// 实现者: PriceImporterImpl
#[async_trait]
pub trait PriceImporter: Send + Sync {
    /// 试导入：解析 + 校验，不落库
    async fn validate_file(&self, file_path: &Path) -> ImportResult<ImportValidationResult>;

    /// 从本地文件导入新价格库（校验不通过时不写入任何数据）
    async fn import_file(
        &self,
        owner_id: i64,
        name: &str,
        file_path: &Path,
    ) -> ImportResult<PriceImportOutcome>;

    /// 从远程地址下载并导入新价格库
    async fn import_from_url(
        &self,
        owner_id: i64,
        name: &str,
        url: &str,
    ) -> ImportResult<PriceImportOutcome>;

    /// 按来源地址重新下载并替换价格库条目
    async fn refresh(&self, price_database_id: i64) -> ImportResult<PriceImportOutcome>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口（固定列顺序 ID | PRODUCTO | PRECIO | UNIDAD）
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始数据行（表头已剔除，空行已跳过，保留表格行号）
    fn parse_rows(&self, file_path: &Path) -> ImportResult<Vec<RawRow>>;
}

// ==========================================
// DataCleaner Trait
// ==========================================
// 用途: 单元格文本清洗
// 实现者: DataCleanerImpl
pub trait DataCleaner: Send + Sync {
    /// TRIM
    fn clean_text(&self, value: &str) -> String;

    /// 标准化 NULL 值（空字符串/空白 → None）
    fn normalize_null(&self, value: &str) -> Option<String>;

    /// 解析价格文本；无法解析时返回 None
    fn parse_price(&self, value: &str) -> Option<Decimal>;
}
