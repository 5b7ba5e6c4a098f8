// ==========================================
// 配方成本核算系统 - 配置层
// ==========================================
// 职责: 系统配置管理（远程换算、兜底策略、配方默认值）
// 存储: config_kv 表 + 环境变量覆写
// ==========================================

pub mod config_manager;
pub mod costing_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, env_keys, ConfigManager};
pub use costing_config_trait::{ConfigResult, CostingConfigReader};
