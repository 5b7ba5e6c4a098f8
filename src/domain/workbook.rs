// ==========================================
// 配方成本核算系统 - 配方（Workbook）领域模型
// ==========================================
// 对齐: workbook / workbook_item 表
// 约定: 百分比字段均为小数（0.16 = 16%）
// ==========================================

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// EntityStatus - 配方状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityStatus {
    Draft,
    Published,
}

impl EntityStatus {
    pub fn to_db_str(self) -> &'static str {
        match self {
            EntityStatus::Draft => "DRAFT",
            EntityStatus::Published => "PUBLISHED",
        }
    }

    pub fn from_db_str(value: &str) -> Self {
        match value.trim().to_uppercase().as_str() {
            "PUBLISHED" => EntityStatus::Published,
            _ => EntityStatus::Draft,
        }
    }
}

impl fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityStatus::Draft => write!(f, "Draft"),
            EntityStatus::Published => write!(f, "Published"),
        }
    }
}

// ==========================================
// WorkbookParams - 核算参数（用户输入）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkbookParams {
    pub production_units: Decimal,           // 产出份数（>= 0）
    pub tax_percentage: Decimal,             // 税率（>= 0）
    pub profit_margin_percentage: Decimal,   // 加成率（>= 0，成本加成口径）
    pub target_sale_price: Option<Decimal>,  // 目标售价（反推实际利润率）
    pub operational_cost_percentage: Decimal, // 运营费用比例（>= 0）
    pub operational_cost_fixed: Decimal,     // 运营费用固定额（>= 0）
}

impl Default for WorkbookParams {
    fn default() -> Self {
        Self {
            production_units: Decimal::ONE,
            tax_percentage: Decimal::new(16, 2),
            profit_margin_percentage: Decimal::new(20, 2),
            target_sale_price: None,
            operational_cost_percentage: Decimal::new(20, 2),
            operational_cost_fixed: Decimal::ZERO,
        }
    }
}

impl WorkbookParams {
    /// 校验非负约束，返回第一个违规字段名
    pub fn first_negative_field(&self) -> Option<&'static str> {
        let checks = [
            ("productionUnits", Some(self.production_units)),
            ("taxPercentage", Some(self.tax_percentage)),
            ("profitMarginPercentage", Some(self.profit_margin_percentage)),
            ("targetSalePrice", self.target_sale_price),
            ("operationalCostPercentage", Some(self.operational_cost_percentage)),
            ("operationalCostFixed", Some(self.operational_cost_fixed)),
        ];

        checks
            .into_iter()
            .find(|(_, value)| value.map_or(false, |v| v < Decimal::ZERO))
            .map(|(name, _)| name)
    }
}

// ==========================================
// Workbook - 配方
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workbook {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    #[serde(flatten)]
    pub params: WorkbookParams,
    pub status: EntityStatus,
    pub created_at: DateTime<Utc>,
}

// ==========================================
// WorkbookLine - 配方明细行
// ==========================================
// unit 为配方中使用的单位，可以与价格条目的单位不同
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkbookLine {
    pub id: Option<i64>, // 未落库时为 None
    pub catalog_item_id: i64,
    pub quantity: Decimal,
    pub unit: String,
    pub additional_cost: Decimal, // 人工附加成本（>= 0）
}
