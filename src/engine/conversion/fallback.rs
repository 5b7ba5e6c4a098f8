// ==========================================
// 配方成本核算系统 - 本地换算比例表
// ==========================================
// 用途: 远程换算不可用时的兜底路径
// 约定: 键为有序对 (from, to)，值为精确比例（1 from = ratio to）
// ==========================================

use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::warn;

static FALLBACK_RATIOS: Lazy<HashMap<(&'static str, &'static str), Decimal>> = Lazy::new(|| {
    let thousand = Decimal::new(1000, 0);
    let thousandth = Decimal::new(1, 3);
    let million = Decimal::new(1_000_000, 0);
    let millionth = Decimal::new(1, 6);

    HashMap::from([
        // 质量
        (("kilogram", "gram"), thousand),
        (("gram", "kilogram"), thousandth),
        (("kilogram", "milligram"), million),
        (("milligram", "kilogram"), millionth),
        (("gram", "milligram"), thousand),
        (("milligram", "gram"), thousandth),
        // 长度
        (("meter", "centimeter"), Decimal::new(100, 0)),
        (("centimeter", "meter"), Decimal::new(1, 2)),
        (("meter", "millimeter"), thousand),
        (("millimeter", "meter"), thousandth),
        (("centimeter", "millimeter"), Decimal::new(10, 0)),
        (("millimeter", "centimeter"), Decimal::new(1, 1)),
        // 体积
        (("liter", "milliliter"), thousand),
        (("milliliter", "liter"), thousandth),
    ])
});

/// 查询比例（参数须已规范化为小写）
pub fn fallback_ratio(from_unit: &str, to_unit: &str) -> Option<Decimal> {
    FALLBACK_RATIOS.get(&(from_unit, to_unit)).copied()
}

/// 本地换算：quantity * ratio（溢出视为无法换算）
pub fn convert_via_fallback(quantity: Decimal, from_unit: &str, to_unit: &str) -> Option<Decimal> {
    let ratio = fallback_ratio(from_unit, to_unit)?;
    let result = quantity.checked_mul(ratio);
    if result.is_none() {
        warn!(quantity = %quantity, from = from_unit, to = to_unit, "本地换算溢出");
    }
    result
}

/// 比例表中的全部有序对
pub fn fallback_pairs() -> Vec<(&'static str, &'static str)> {
    let mut pairs: Vec<_> = FALLBACK_RATIOS.keys().copied().collect();
    pairs.sort_unstable();
    pairs
}
