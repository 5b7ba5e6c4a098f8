// ==========================================
// 配方成本核算系统 - 核算配置读取 Trait
// ==========================================
// 职责: 定义换算服务/核算引擎/配方默认值所需的配置读取接口
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::engine::conversion::RapidApiSettings;
use crate::engine::costing::FallbackPolicy;
use crate::domain::workbook::WorkbookParams;
use async_trait::async_trait;
use std::error::Error;

/// 配置读取结果
pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// CostingConfigReader Trait
// ==========================================
// 实现者: ConfigManager（config_kv 表 + 环境变量覆写）
#[async_trait]
pub trait CostingConfigReader: Send + Sync {
    // ===== 远程换算服务 =====

    /// 远程换算连接参数
    ///
    /// # 说明
    /// base_url / host / api_key 任一缺失时服务只走本地比例表
    async fn get_rapidapi_settings(&self) -> ConfigResult<RapidApiSettings>;

    /// 远程换算超时（毫秒）
    ///
    /// # 默认值
    /// - 5000
    async fn get_conversion_timeout_ms(&self) -> ConfigResult<u64>;

    // ===== 核算 =====

    /// 换算不可用时的计价策略
    ///
    /// # 默认值
    /// - ASSUME_ONE_TO_ONE
    async fn get_fallback_policy(&self) -> ConfigResult<FallbackPolicy>;

    /// 新建配方的默认核算参数
    ///
    /// # 默认值
    /// - 产出 1 份、税率 0.16、加成率 0.20、运营费用比例 0.20、固定额 0
    async fn get_workbook_defaults(&self) -> ConfigResult<WorkbookParams>;

    // ===== 消息 =====

    /// 面向用户的消息语言
    ///
    /// # 默认值
    /// - es
    async fn get_message_locale(&self) -> ConfigResult<String>;
}
