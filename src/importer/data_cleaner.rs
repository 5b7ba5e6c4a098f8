// ==========================================
// 配方成本核算系统 - 数据清洗器实现
// ==========================================
// 职责: TRIM / NULL 标准化 / 价格文本解析
// ==========================================

use crate::importer::price_importer_trait::DataCleaner as DataCleanerTrait;
use rust_decimal::Decimal;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default)]
pub struct DataCleaner;

impl DataCleanerTrait for DataCleaner {
    fn clean_text(&self, value: &str) -> String {
        value.trim().to_string()
    }

    fn normalize_null(&self, value: &str) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    fn parse_price(&self, value: &str) -> Option<Decimal> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return None;
        }
        // 表格数值单元格可能以科学计数法输出
        Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .ok()
    }
}
