// ==========================================
// 换算测试替身
// ==========================================
// MockProvider: 可编排的远程提供方（记录调用与完成次数）
// FixedConverter: 固定比例表的 UnitConverter
// ==========================================

use async_trait::async_trait;
use costing_engine::engine::conversion::{ConversionError, ConversionProvider, ConversionResult};
use costing_engine::engine::UnitConverter;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// 远程提供方的行为
#[derive(Debug, Clone)]
pub enum ProviderBehavior {
    /// 按比例表换算，表外单位返回 Status 404
    Ratios(HashMap<(String, String), Decimal>),
    /// 始终返回 HTTP 错误
    Fail { status: u16 },
    /// 延迟后返回固定结果
    Slow { delay: Duration, value: Decimal },
}

pub struct MockProvider {
    behavior: ProviderBehavior,
    calls: AtomicUsize,
    completed: AtomicUsize,
}

impl MockProvider {
    pub fn new(behavior: ProviderBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
        }
    }

    pub fn with_ratios(ratios: &[(&str, &str, Decimal)]) -> Self {
        let table = ratios
            .iter()
            .map(|(from, to, ratio)| ((from.to_string(), to.to_string()), *ratio))
            .collect();
        Self::new(ProviderBehavior::Ratios(table))
    }

    pub fn failing(status: u16) -> Self {
        Self::new(ProviderBehavior::Fail { status })
    }

    pub fn slow(delay: Duration, value: Decimal) -> Self {
        Self::new(ProviderBehavior::Slow { delay, value })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// 已返回结果的调用次数（被取消的调用不计）
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConversionProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn convert(
        &self,
        quantity: Decimal,
        from_unit: &str,
        to_unit: &str,
    ) -> ConversionResult<Decimal> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = match &self.behavior {
            ProviderBehavior::Ratios(table) => table
                .get(&(from_unit.to_string(), to_unit.to_string()))
                .map(|ratio| quantity * ratio)
                .ok_or(ConversionError::Status { status: 404 }),
            ProviderBehavior::Fail { status } => Err(ConversionError::Status { status: *status }),
            ProviderBehavior::Slow { delay, value } => {
                tokio::time::sleep(*delay).await;
                Ok(*value)
            }
        };
        self.completed.fetch_add(1, Ordering::SeqCst);
        result
    }
}

/// 固定比例表换算器（同单位恒等，表外返回 None）
pub struct FixedConverter {
    ratios: HashMap<(String, String), Decimal>,
}

impl FixedConverter {
    pub fn new(ratios: &[(&str, &str, Decimal)]) -> Self {
        Self {
            ratios: ratios
                .iter()
                .map(|(from, to, ratio)| ((from.to_string(), to.to_string()), *ratio))
                .collect(),
        }
    }

    /// 只认识质量单位
    pub fn mass() -> Self {
        Self::new(&[
            ("kilogram", "gram", Decimal::new(1000, 0)),
            ("gram", "kilogram", Decimal::new(1, 3)),
        ])
    }

    /// 什么都不认识
    pub fn empty() -> Self {
        Self::new(&[])
    }
}

#[async_trait]
impl UnitConverter for FixedConverter {
    async fn convert(&self, quantity: Decimal, from_unit: &str, to_unit: &str) -> Option<Decimal> {
        let from = from_unit.trim().to_lowercase();
        let to = to_unit.trim().to_lowercase();
        if from == to {
            return Some(quantity);
        }
        self.ratios.get(&(from, to)).map(|ratio| quantity * ratio)
    }
}
