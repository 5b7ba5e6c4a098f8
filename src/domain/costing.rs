// ==========================================
// 配方成本核算系统 - 核算结果模型
// ==========================================
// 红线: 每次请求现算，不缓存、不落库
//       （上游价格修改必须立即反映到核算结果）
// ==========================================

use crate::domain::workbook::{EntityStatus, Workbook, WorkbookParams};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

// ==========================================
// LineConversion - 单行单位换算结论
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineConversion {
    /// 配方单位与价格单位一致
    SameUnit,
    /// 已换算：1 个价格单位 = factor 个配方单位
    Converted { factor: Decimal },
    /// 换算不可用，按 1:1 计价（未经核实）
    AssumedOneToOne,
}

// ==========================================
// LineCost - 单行核算明细
// ==========================================
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineCost {
    pub line_id: Option<i64>,
    pub catalog_item_id: i64,
    pub product_name: String,
    pub original_price: Decimal,
    pub original_unit: String,
    pub quantity_used: Decimal,
    pub unit_used: String,
    pub additional_cost: Decimal,

    pub calculated_cost: Decimal,      // 含附加成本
    pub weight_grams: Option<Decimal>, // 无法换算为克时为 None（不计入总重）
    pub conversion: LineConversion,
    pub conversion_note: String, // 可读说明，同单位时为空
}

// ==========================================
// CostBreakdown - 成本拆解
// ==========================================
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    // ===== 重量 =====
    pub total_weight_grams: Decimal,
    pub unit_weight: Decimal,

    // ===== 成本 =====
    pub production_cost: Decimal,  // 原料成本（不含附加）
    pub additional_cost: Decimal,  // 附加成本合计
    pub operational_cost: Decimal, // (原料 + 附加) * 比例 + 固定额
    pub subtotal_cost: Decimal,
    pub tax_amount: Decimal,
    pub total_cost: Decimal,
    pub unit_cost: Decimal,

    // ===== 定价 =====
    pub suggested_price: Decimal,
    pub actual_profit_margin: Option<Decimal>, // 仅在设置目标售价时计算

    pub lines: Vec<LineCost>,
}

// ==========================================
// WorkbookDetail - 配方详情（展示层）
// ==========================================
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkbookDetail {
    pub id: i64,
    pub name: String,
    pub status: EntityStatus,
    #[serde(flatten)]
    pub params: WorkbookParams,
    pub weight_unit: &'static str,
    #[serde(flatten)]
    pub breakdown: CostBreakdown,
}

impl WorkbookDetail {
    pub fn new(workbook: &Workbook, breakdown: CostBreakdown) -> Self {
        Self {
            id: workbook.id,
            name: workbook.name.clone(),
            status: workbook.status,
            params: workbook.params.clone(),
            weight_unit: "g",
            breakdown,
        }
    }
}

// ==========================================
// WorkbookSummary - 配方列表摘要
// ==========================================
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkbookSummary {
    pub id: i64,
    pub name: String,
    pub selling_price: Decimal,
    pub profit_margin: Decimal,
    pub production_units: Decimal,
    pub status: EntityStatus,
    pub created_at: DateTime<Utc>,
}

impl WorkbookSummary {
    /// 利润率口径：有非零实际利润率时展示实际值，否则展示设定加成率
    pub fn new(workbook: &Workbook, breakdown: &CostBreakdown) -> Self {
        let profit_margin = match breakdown.actual_profit_margin {
            Some(actual) if !actual.is_zero() => actual,
            _ => workbook.params.profit_margin_percentage,
        };

        Self {
            id: workbook.id,
            name: workbook.name.clone(),
            selling_price: breakdown.suggested_price,
            profit_margin,
            production_units: workbook.params.production_units,
            status: workbook.status,
            created_at: workbook.created_at,
        }
    }
}
