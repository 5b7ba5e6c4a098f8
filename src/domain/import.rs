// ==========================================
// 配方成本核算系统 - 价格导入领域模型
// ==========================================
// 用途: 导入管道中间产物（行读取 → 行校验 → 结果报告）
// 生命周期: 仅在导入流程内
// ==========================================

use crate::domain::catalog::NewPriceItem;
use serde::{Deserialize, Serialize};

// 固定列顺序: ID | PRODUCTO | PRECIO | UNIDAD
pub const COLUMN_EXTERNAL_ID: &str = "ID";
pub const COLUMN_PRODUCT: &str = "Producto";
pub const COLUMN_PRICE: &str = "Precio";
pub const COLUMN_UNIT: &str = "Unidad";

// 表头占第 1 行，第一条数据行号为 2
pub const FIRST_DATA_ROW: usize = 2;

// ==========================================
// RawRow - 原始数据行（表头已剔除）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRow {
    pub row_number: usize, // 表格行号（用于错误定位）
    pub external_id: String,
    pub product: String,
    pub price_text: String,
    pub unit: String,
}

impl RawRow {
    pub fn new(
        row_number: usize,
        external_id: impl Into<String>,
        product: impl Into<String>,
        price_text: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            row_number,
            external_id: external_id.into(),
            product: product.into(),
            price_text: price_text.into(),
            unit: unit.into(),
        }
    }

    /// 按位置编号的四元组序列（第 i 条数据行 → 行号 i + 2）
    pub fn from_tuples<S: Into<String>>(rows: Vec<(S, S, S, S)>) -> Vec<RawRow> {
        rows.into_iter()
            .enumerate()
            .map(|(idx, (id, product, price, unit))| {
                RawRow::new(idx + FIRST_DATA_ROW, id, product, price, unit)
            })
            .collect()
    }
}

// ==========================================
// RowError - 行级校验错误（同一行可有多条）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowError {
    pub row: usize,
    pub column: String,
    pub raw_value: String,
    pub message: String,
}

// ==========================================
// ImportValidationResult - 导入校验结果
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportValidationResult {
    pub is_valid: bool, // errors 为空且 valid_items 非空
    pub total_rows: usize,
    pub errors: Vec<RowError>,
    pub valid_items: Vec<NewPriceItem>,
}

impl ImportValidationResult {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// 出错的行号（去重，升序）
    pub fn rejected_rows(&self) -> Vec<usize> {
        let mut rows: Vec<usize> = self.errors.iter().map(|e| e.row).collect();
        rows.sort_unstable();
        rows.dedup();
        rows
    }
}
