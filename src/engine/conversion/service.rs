// ==========================================
// 配方成本核算系统 - 单位换算服务
// ==========================================
// 策略: 同单位直返 → 远程提供方 → 本地比例表 → None
// 红线: 对外从不返回错误；远程失败只记日志
// 约定: convert(1, A, B) = 每 1 个 A 等于多少个 B
// ==========================================

use super::error::ConversionError;
use super::fallback::convert_via_fallback;
use super::provider::ConversionProvider;
use crate::engine::unit_catalog::normalize_unit_code;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_millis(5000);

// ==========================================
// UnitConverter Trait - 核算引擎依赖的换算接口
// ==========================================
#[async_trait]
pub trait UnitConverter: Send + Sync {
    /// 换算数量；无法换算时返回 None
    async fn convert(&self, quantity: Decimal, from_unit: &str, to_unit: &str) -> Option<Decimal>;
}

// ==========================================
// UnitConversionService
// ==========================================
#[derive(Clone)]
pub struct UnitConversionService {
    provider: Option<Arc<dyn ConversionProvider>>,
    remote_timeout: Duration,
}

impl UnitConversionService {
    pub fn new(provider: Arc<dyn ConversionProvider>, remote_timeout: Duration) -> Self {
        Self {
            provider: Some(provider),
            remote_timeout,
        }
    }

    /// 仅使用本地比例表
    pub fn offline() -> Self {
        Self {
            provider: None,
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
        }
    }

    pub fn has_remote(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn convert(&self, quantity: Decimal, from_unit: &str, to_unit: &str) -> Option<Decimal> {
        let from = normalize_unit_code(from_unit);
        let to = normalize_unit_code(to_unit);

        if from == to {
            return Some(quantity);
        }

        match self.convert_remote(quantity, &from, &to).await {
            Ok(result) => {
                info!(
                    quantity = %quantity,
                    from = %from,
                    to = %to,
                    result = %result,
                    "远程换算成功"
                );
                return Some(result);
            }
            Err(e) => {
                warn!(
                    quantity = %quantity,
                    from = %from,
                    to = %to,
                    error = %e,
                    "远程换算失败，尝试本地比例表"
                );
            }
        }

        let result = convert_via_fallback(quantity, &from, &to);
        match result {
            Some(value) => info!(
                quantity = %quantity,
                from = %from,
                to = %to,
                result = %value,
                "本地比例表换算成功"
            ),
            None => warn!(quantity = %quantity, from = %from, to = %to, "无法换算"),
        }
        result
    }

    async fn convert_remote(
        &self,
        quantity: Decimal,
        from: &str,
        to: &str,
    ) -> Result<Decimal, ConversionError> {
        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| ConversionError::NotConfigured("未配置远程提供方".to_string()))?;

        match tokio::time::timeout(self.remote_timeout, provider.convert(quantity, from, to)).await {
            Ok(result) => result,
            Err(_) => Err(ConversionError::Timeout {
                timeout_ms: self.remote_timeout.as_millis() as u64,
            }),
        }
    }
}

impl Default for UnitConversionService {
    fn default() -> Self {
        Self::offline()
    }
}

#[async_trait]
impl UnitConverter for UnitConversionService {
    async fn convert(&self, quantity: Decimal, from_unit: &str, to_unit: &str) -> Option<Decimal> {
        UnitConversionService::convert(self, quantity, from_unit, to_unit).await
    }
}
