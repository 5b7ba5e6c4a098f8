// ==========================================
// 配方成本核算系统 - 远程换算提供方
// ==========================================
// 协议: GET {base_url}/convert?value=&from=&to=
//       请求头 X-RapidAPI-Host / X-RapidAPI-Key
// 响应: 取 result → value → convertedValue 中第一个数值字段
// ==========================================

use super::error::{ConversionError, ConversionResult};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

// 响应中候选数值字段（按优先级）
const RESPONSE_VALUE_FIELDS: [&str; 3] = ["result", "value", "convertedValue"];

// ==========================================
// ConversionProvider Trait
// ==========================================
#[async_trait]
pub trait ConversionProvider: Send + Sync {
    /// 提供方名称（日志用）
    fn name(&self) -> &str;

    /// 远程换算，参数单位均已规范化
    async fn convert(&self, quantity: Decimal, from_unit: &str, to_unit: &str)
        -> ConversionResult<Decimal>;
}

// ==========================================
// RapidApiSettings - 远程服务连接参数
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RapidApiSettings {
    pub base_url: Option<String>,
    pub host: Option<String>,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
}

impl RapidApiSettings {
    /// 三项连接参数均非空才视为已配置
    pub fn is_complete(&self) -> bool {
        [&self.base_url, &self.host, &self.api_key]
            .iter()
            .all(|v| v.as_deref().map_or(false, |s| !s.trim().is_empty()))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// ==========================================
// RapidApiProvider - reqwest 实现
// ==========================================
pub struct RapidApiProvider {
    client: reqwest::Client,
    settings: RapidApiSettings,
}

impl RapidApiProvider {
    pub fn new(settings: RapidApiSettings) -> ConversionResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| ConversionError::ClientBuild(e.to_string()))?;

        Ok(Self::with_client(settings, client))
    }

    /// 使用外部构建的 HTTP 客户端（超时等参数由调用方负责）
    pub fn with_client(settings: RapidApiSettings, client: reqwest::Client) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &RapidApiSettings {
        &self.settings
    }

    fn endpoint(&self) -> ConversionResult<(String, &str, &str)> {
        match (
            self.settings.base_url.as_deref(),
            self.settings.host.as_deref(),
            self.settings.api_key.as_deref(),
        ) {
            (Some(base_url), Some(host), Some(key)) if self.settings.is_complete() => Ok((
                format!("{}/convert", base_url.trim_end_matches('/')),
                host,
                key,
            )),
            _ => Err(ConversionError::NotConfigured(
                "base_url / host / api_key".to_string(),
            )),
        }
    }
}

#[async_trait]
impl ConversionProvider for RapidApiProvider {
    fn name(&self) -> &str {
        "rapidapi"
    }

    async fn convert(
        &self,
        quantity: Decimal,
        from_unit: &str,
        to_unit: &str,
    ) -> ConversionResult<Decimal> {
        let (url, host, key) = self.endpoint()?;
        let value = quantity.to_string();

        debug!(url = %url, value = %value, from = from_unit, to = to_unit, "请求远程换算");

        let response = self
            .client
            .get(&url)
            .header("X-RapidAPI-Host", host)
            .header("X-RapidAPI-Key", key)
            .query(&[("value", value.as_str()), ("from", from_unit), ("to", to_unit)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConversionError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        extract_converted_value(&body)
    }
}

/// 从响应体中提取换算结果
pub fn extract_converted_value(body: &str) -> ConversionResult<Decimal> {
    let root: Value = serde_json::from_str(body)?;

    RESPONSE_VALUE_FIELDS
        .iter()
        .find_map(|field| root.get(*field).and_then(decimal_from_json))
        .ok_or_else(|| ConversionError::MissingValue {
            body: body.chars().take(200).collect(),
        })
}

// 仅接受 JSON 数值（字符串数值视为不可用）
fn decimal_from_json(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
        }
        _ => None,
    }
}
