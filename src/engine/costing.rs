// ==========================================
// 配方成本核算系统 - 成本核算引擎
// ==========================================
// 职责: 配方明细 → 成本拆解 + 建议售价 + 实际利润率反推
// 输入: 核算参数 + 明细行 + 价格条目查询 + 单位换算
// 输出: CostBreakdown（每次现算）
// ==========================================
// 红线: 单行换算失败不得中断整体核算（默认按 1:1 计价并标注）
// 并发: 各行换算并发执行，汇总按行序
// ==========================================

use crate::domain::catalog::CatalogItem;
use crate::domain::costing::{CostBreakdown, LineConversion, LineCost};
use crate::domain::workbook::{WorkbookLine, WorkbookParams};
use crate::engine::conversion::UnitConverter;
use crate::engine::unit_catalog::normalize_unit_code;
use crate::i18n;
use futures::future::join_all;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// 重量汇总的基准单位
pub const WEIGHT_UNIT: &str = "gram";

// ==========================================
// CostingError - 核算错误
// ==========================================
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CostingError {
    #[error("价格条目不存在: catalog_item_id={catalog_item_id}")]
    CatalogItemNotFound { catalog_item_id: i64 },

    #[error("存在 {} 行无法完成单位换算", .0.len())]
    UnresolvedConversions(Vec<UnresolvedConversion>),

    #[error("明细行 #{} 金额计算溢出", .line_index + 1)]
    LineOverflow { line_index: usize },

    #[error("汇总金额计算溢出")]
    TotalsOverflow,
}

pub type CostingResult<T> = Result<T, CostingError>;

/// 换算未解决的明细行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedConversion {
    pub line_index: usize,
    pub catalog_item_id: i64,
    pub from_unit: String,
    pub to_unit: String,
}

impl fmt::Display for UnresolvedConversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} (item {}): {} -> {}",
            self.line_index + 1,
            self.catalog_item_id,
            self.from_unit,
            self.to_unit
        )
    }
}

// ==========================================
// FallbackPolicy - 换算不可用时的计价策略
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// 按 1:1 计价并标注未核实
    #[default]
    AssumeOneToOne,
    /// 拒绝核算
    Reject,
}

impl FallbackPolicy {
    pub fn to_db_str(self) -> &'static str {
        match self {
            FallbackPolicy::AssumeOneToOne => "ASSUME_ONE_TO_ONE",
            FallbackPolicy::Reject => "REJECT",
        }
    }

    pub fn from_db_str(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "ASSUME_ONE_TO_ONE" => Some(FallbackPolicy::AssumeOneToOne),
            "REJECT" => Some(FallbackPolicy::Reject),
            _ => None,
        }
    }
}

// ==========================================
// CatalogLookup Trait - 价格条目查询
// ==========================================
pub trait CatalogLookup: Sync {
    fn find_item(&self, catalog_item_id: i64) -> Option<&CatalogItem>;
}

impl CatalogLookup for HashMap<i64, CatalogItem> {
    fn find_item(&self, catalog_item_id: i64) -> Option<&CatalogItem> {
        self.get(&catalog_item_id)
    }
}

impl CatalogLookup for [CatalogItem] {
    fn find_item(&self, catalog_item_id: i64) -> Option<&CatalogItem> {
        self.iter().find(|item| item.id == catalog_item_id)
    }
}

impl CatalogLookup for Vec<CatalogItem> {
    fn find_item(&self, catalog_item_id: i64) -> Option<&CatalogItem> {
        self.as_slice().find_item(catalog_item_id)
    }
}

// ==========================================
// CostingEngine
// ==========================================
#[derive(Debug, Clone)]
pub struct CostingEngine {
    policy: FallbackPolicy,
    locale: String,
}

impl Default for CostingEngine {
    fn default() -> Self {
        Self::new(FallbackPolicy::default())
    }
}

impl CostingEngine {
    pub fn new(policy: FallbackPolicy) -> Self {
        Self {
            policy,
            locale: i18n::DEFAULT_LOCALE.to_string(),
        }
    }

    /// 换算说明使用的语言
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn policy(&self) -> FallbackPolicy {
        self.policy
    }

    /// 核算配方
    #[instrument(skip_all, fields(lines = lines.len(), policy = ?self.policy))]
    pub async fn compute<L>(
        &self,
        params: &WorkbookParams,
        lines: &[WorkbookLine],
        catalog: &L,
        converter: &dyn UnitConverter,
    ) -> CostingResult<CostBreakdown>
    where
        L: CatalogLookup + ?Sized,
    {
        // 1. 解析价格条目（数据完整性问题直接报错）
        let mut resolved = Vec::with_capacity(lines.len());
        for line in lines {
            let item = catalog.find_item(line.catalog_item_id).ok_or(
                CostingError::CatalogItemNotFound {
                    catalog_item_id: line.catalog_item_id,
                },
            )?;
            resolved.push((line, item));
        }

        // 2. 各行并发换算（价格换算与重量换算同时进行）
        let priced = join_all(
            resolved
                .into_iter()
                .enumerate()
                .map(|(idx, (line, item))| self.price_line(idx, line, item, converter)),
        )
        .await
        .into_iter()
        .collect::<CostingResult<Vec<LineCost>>>()?;

        // 3. 策略检查
        if self.policy == FallbackPolicy::Reject {
            let unresolved: Vec<UnresolvedConversion> = priced
                .iter()
                .enumerate()
                .filter(|(_, cost)| cost.conversion == LineConversion::AssumedOneToOne)
                .map(|(idx, cost)| UnresolvedConversion {
                    line_index: idx,
                    catalog_item_id: cost.catalog_item_id,
                    from_unit: cost.original_unit.clone(),
                    to_unit: cost.unit_used.clone(),
                })
                .collect();

            if !unresolved.is_empty() {
                warn!(count = unresolved.len(), "存在无法换算的明细行，拒绝核算");
                return Err(CostingError::UnresolvedConversions(unresolved));
            }
        }

        // 4. 汇总
        aggregate(params, priced)
    }

    async fn price_line(
        &self,
        line_index: usize,
        line: &WorkbookLine,
        item: &CatalogItem,
        converter: &dyn UnitConverter,
    ) -> CostingResult<LineCost> {
        let same_unit = normalize_unit_code(&line.unit) == normalize_unit_code(&item.unit);

        let factor_fut = async {
            if same_unit {
                None
            } else {
                converter.convert(Decimal::ONE, &item.unit, &line.unit).await
            }
        };
        let weight_fut = converter.convert(line.quantity, &line.unit, WEIGHT_UNIT);
        let (factor, weight_grams) = futures::join!(factor_fut, weight_fut);

        let (conversion, unit_price) = if same_unit {
            (LineConversion::SameUnit, item.price)
        } else {
            match factor
                .filter(|f| !f.is_zero())
                .and_then(|f| item.price.checked_div(f).map(|p| (f, p)))
            {
                Some((factor, price_per_line_unit)) => {
                    (LineConversion::Converted { factor }, price_per_line_unit)
                }
                None => (LineConversion::AssumedOneToOne, item.price),
            }
        };

        let conversion_note = match conversion {
            LineConversion::SameUnit => String::new(),
            LineConversion::Converted { factor } => i18n::tr(
                &self.locale,
                "costing.note_converted",
                &[
                    ("from", item.unit.as_str()),
                    ("factor", &factor.normalize().to_string()),
                    ("to", line.unit.as_str()),
                ],
            ),
            LineConversion::AssumedOneToOne => {
                warn!(
                    catalog_item_id = item.id,
                    from = %item.unit,
                    to = %line.unit,
                    "单位换算不可用，按 1:1 计价"
                );
                i18n::tr(
                    &self.locale,
                    "costing.note_assumed_one_to_one",
                    &[("from", item.unit.as_str()), ("to", line.unit.as_str())],
                )
            }
        };

        let calculated_cost = unit_price
            .checked_mul(line.quantity)
            .and_then(|cost| cost.checked_add(line.additional_cost))
            .ok_or_else(|| {
                warn!(line_index, catalog_item_id = item.id, "明细行金额溢出");
                CostingError::LineOverflow { line_index }
            })?;

        debug!(
            catalog_item_id = item.id,
            calculated_cost = %calculated_cost,
            weight_grams = ?weight_grams,
            "明细行核算完成"
        );

        Ok(LineCost {
            line_id: line.id,
            catalog_item_id: item.id,
            product_name: item.product.clone(),
            original_price: item.price,
            original_unit: item.unit.clone(),
            quantity_used: line.quantity,
            unit_used: line.unit.clone(),
            additional_cost: line.additional_cost,
            calculated_cost,
            weight_grams,
            conversion,
            conversion_note,
        })
    }
}

/// 汇总明细行，计算成本、售价与实际利润率
///
/// 任一中间金额超出 Decimal 范围时返回 `TotalsOverflow`
pub fn aggregate(params: &WorkbookParams, lines: Vec<LineCost>) -> CostingResult<CostBreakdown> {
    let add = |a: Decimal, b: Decimal| a.checked_add(b).ok_or(CostingError::TotalsOverflow);
    let mul = |a: Decimal, b: Decimal| a.checked_mul(b).ok_or(CostingError::TotalsOverflow);

    let mut production_cost = Decimal::ZERO;
    let mut additional_cost = Decimal::ZERO;
    let mut total_weight_grams = Decimal::ZERO;

    for line in &lines {
        let material = line
            .calculated_cost
            .checked_sub(line.additional_cost)
            .ok_or(CostingError::TotalsOverflow)?;
        production_cost = add(production_cost, material)?;
        additional_cost = add(additional_cost, line.additional_cost)?;
        if let Some(grams) = line.weight_grams {
            total_weight_grams = add(total_weight_grams, grams)?;
        }
    }

    let units = params.production_units;
    let per_unit = |value: Decimal| -> CostingResult<Decimal> {
        if units > Decimal::ZERO {
            value.checked_div(units).ok_or(CostingError::TotalsOverflow)
        } else {
            Ok(Decimal::ZERO)
        }
    };

    let direct_cost = add(production_cost, additional_cost)?;
    let operational_cost = add(
        mul(direct_cost, params.operational_cost_percentage)?,
        params.operational_cost_fixed,
    )?;
    let subtotal_cost = add(direct_cost, operational_cost)?;
    let tax_amount = mul(subtotal_cost, params.tax_percentage)?;
    let total_cost = add(subtotal_cost, tax_amount)?;
    let unit_cost = per_unit(total_cost)?;

    // 成本加成口径
    let suggested_price = mul(unit_cost, add(Decimal::ONE, params.profit_margin_percentage)?)?;

    let actual_profit_margin = params
        .target_sale_price
        .filter(|target| *target > Decimal::ZERO)
        .map(|target| {
            if unit_cost > Decimal::ZERO {
                target
                    .checked_div(unit_cost)
                    .map(|ratio| ratio - Decimal::ONE)
                    .unwrap_or(Decimal::ONE)
            } else {
                // 成本为零时约定为 100%
                Decimal::ONE
            }
        });

    Ok(CostBreakdown {
        total_weight_grams,
        unit_weight: per_unit(total_weight_grams)?,
        production_cost,
        additional_cost,
        operational_cost,
        subtotal_cost,
        tax_amount,
        total_cost,
        unit_cost,
        suggested_price,
        actual_profit_margin,
        lines,
    })
}
