// ==========================================
// 配方成本核算系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、写入
// 存储: config_kv 表 (key-value + scope)
// 覆写: 远程换算的密钥类配置可由环境变量覆写（环境变量优先）
// ==========================================

use crate::config::costing_config_trait::{ConfigResult, CostingConfigReader};
use crate::db::open_and_migrate;
use crate::domain::workbook::WorkbookParams;
use crate::engine::conversion::RapidApiSettings;
use crate::engine::costing::FallbackPolicy;
use crate::i18n::DEFAULT_LOCALE;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
    use_env: bool,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_and_migrate(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            use_env: true,
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn, use_env: true })
    }

    /// 忽略环境变量覆写（仅读 config_kv）
    pub fn without_env_overrides(mut self) -> Self {
        self.use_env = false;
        self
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![GLOBAL_SCOPE, key, value],
        )?;
        Ok(())
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 环境变量优先，其次 config_kv；空白视为未设置
    fn get_with_env_override(&self, env_key: &str, key: &str) -> ConfigResult<Option<String>> {
        if self.use_env {
            if let Ok(value) = std::env::var(env_key) {
                if !value.trim().is_empty() {
                    return Ok(Some(value.trim().to_string()));
                }
            }
        }

        Ok(self
            .get_config_value(key)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()))
    }

    fn get_decimal_or_default(&self, key: &str, default: Decimal) -> ConfigResult<Decimal> {
        let value = self.get_config_value(key)?;
        Ok(match value {
            Some(raw) => match Decimal::from_str(raw.trim()) {
                Ok(v) if v >= Decimal::ZERO => v,
                _ => {
                    tracing::warn!(config_key = key, raw_value = %raw, "配置值格式错误，使用默认值");
                    default
                }
            },
            None => default,
        })
    }

    /// 获取所有配置的快照（JSON格式，密钥脱敏）
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            let value = if key == config_keys::RAPIDAPI_KEY {
                "***".to_string()
            } else {
                value
            };
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }
}

// ==========================================
// CostingConfigReader Trait 实现
// ==========================================
#[async_trait]
impl CostingConfigReader for ConfigManager {
    // ===== 远程换算服务 =====

    async fn get_rapidapi_settings(&self) -> ConfigResult<RapidApiSettings> {
        Ok(RapidApiSettings {
            base_url: self.get_with_env_override(env_keys::RAPIDAPI_BASE_URL, config_keys::RAPIDAPI_BASE_URL)?,
            host: self.get_with_env_override(env_keys::RAPIDAPI_HOST, config_keys::RAPIDAPI_HOST)?,
            api_key: self.get_with_env_override(env_keys::RAPIDAPI_KEY, config_keys::RAPIDAPI_KEY)?,
            timeout_ms: self.get_conversion_timeout_ms().await?,
        })
    }

    async fn get_conversion_timeout_ms(&self) -> ConfigResult<u64> {
        let value = self.get_config_or_default(config_keys::CONVERSION_TIMEOUT_MS, "5000")?;
        Ok(value.trim().parse::<u64>().ok().filter(|ms| *ms > 0).unwrap_or(5000))
    }

    // ===== 核算 =====

    async fn get_fallback_policy(&self) -> ConfigResult<FallbackPolicy> {
        let value = self.get_config_or_default(
            config_keys::CONVERSION_FALLBACK_POLICY,
            FallbackPolicy::AssumeOneToOne.to_db_str(),
        )?;
        Ok(FallbackPolicy::from_db_str(&value).unwrap_or_else(|| {
            tracing::warn!(
                config_key = config_keys::CONVERSION_FALLBACK_POLICY,
                raw_value = %value,
                "换算兜底策略配置无效，使用 ASSUME_ONE_TO_ONE"
            );
            FallbackPolicy::AssumeOneToOne
        }))
    }

    async fn get_workbook_defaults(&self) -> ConfigResult<WorkbookParams> {
        let base = WorkbookParams::default();
        Ok(WorkbookParams {
            tax_percentage: self
                .get_decimal_or_default(config_keys::DEFAULT_TAX_PERCENTAGE, base.tax_percentage)?,
            profit_margin_percentage: self.get_decimal_or_default(
                config_keys::DEFAULT_PROFIT_MARGIN_PERCENTAGE,
                base.profit_margin_percentage,
            )?,
            operational_cost_percentage: self.get_decimal_or_default(
                config_keys::DEFAULT_OPERATIONAL_COST_PERCENTAGE,
                base.operational_cost_percentage,
            )?,
            ..base
        })
    }

    // ===== 消息 =====

    async fn get_message_locale(&self) -> ConfigResult<String> {
        let value = self.get_config_or_default(config_keys::MESSAGE_LOCALE, DEFAULT_LOCALE)?;
        Ok(match value.trim() {
            "en" => "en".to_string(),
            _ => DEFAULT_LOCALE.to_string(),
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 远程换算
    pub const RAPIDAPI_BASE_URL: &str = "rapidapi_base_url";
    pub const RAPIDAPI_HOST: &str = "rapidapi_host";
    pub const RAPIDAPI_KEY: &str = "rapidapi_key";
    pub const CONVERSION_TIMEOUT_MS: &str = "conversion_timeout_ms";

    // 核算
    pub const CONVERSION_FALLBACK_POLICY: &str = "conversion_fallback_policy";

    // 配方默认值
    pub const DEFAULT_TAX_PERCENTAGE: &str = "default_tax_percentage";
    pub const DEFAULT_PROFIT_MARGIN_PERCENTAGE: &str = "default_profit_margin_percentage";
    pub const DEFAULT_OPERATIONAL_COST_PERCENTAGE: &str = "default_operational_cost_percentage";

    // 消息语言
    pub const MESSAGE_LOCALE: &str = "message_locale";
}

// ==========================================
// 环境变量名
// ==========================================
pub mod env_keys {
    pub const RAPIDAPI_BASE_URL: &str = "COSTING_RAPIDAPI_BASE_URL";
    pub const RAPIDAPI_HOST: &str = "COSTING_RAPIDAPI_HOST";
    pub const RAPIDAPI_KEY: &str = "COSTING_RAPIDAPI_KEY";
    pub const DB_PATH: &str = "COSTING_DB_PATH";
    pub const LOG_FORMAT: &str = "COSTING_LOG_FORMAT";
}
