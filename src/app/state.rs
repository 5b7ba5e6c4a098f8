// ==========================================
// 配方成本核算系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::api::{PriceDatabaseApi, SubscriptionQuota, UnitsApi, UnlimitedQuota, WorkbookApi};
use crate::config::{env_keys, ConfigManager, CostingConfigReader};
use crate::engine::conversion::{
    ConversionProvider, RapidApiProvider, UnitConversionService, UnitConverter,
};
use crate::engine::costing::CostingEngine;
use crate::engine::unit_catalog::UnitCatalog;
use crate::importer::{ImportValidator, PriceImporterImpl};
use crate::repository::{PriceDatabaseRepository, WorkbookRepository};

/// 应用状态
///
/// 包含所有API实例和共享资源，所有仓储共用同一个数据库连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 单位换算服务
    pub conversion_service: Arc<UnitConversionService>,

    /// 计量单位API
    pub units_api: UnitsApi,

    /// 价格库API
    pub price_database_api: Arc<PriceDatabaseApi>,

    /// 配方API
    pub workbook_api: Arc<WorkbookApi>,
}

impl AppState {
    /// 创建新的AppState实例（不限配额）
    pub async fn new(db_path: String) -> Result<Self, String> {
        Self::with_quota(db_path, Arc::new(UnlimitedQuota)).await
    }

    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（":memory:" 为内存库）
    /// - quota: 订阅配额检查
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并建表
    /// 2. 读取配置，构建换算服务（远程参数不全时只走本地比例表）
    /// 3. 创建所有API实例
    pub async fn with_quota(
        db_path: String,
        quota: Arc<dyn SubscriptionQuota>,
    ) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = crate::db::open_and_migrate(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let price_repo = Arc::new(PriceDatabaseRepository::from_connection(conn.clone()));
        let workbook_repo = Arc::new(WorkbookRepository::from_connection(conn.clone()));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化Engine层
        // ==========================================
        let locale = config_manager
            .get_message_locale()
            .await
            .map_err(|e| format!("读取消息语言失败: {}", e))?;
        let policy = config_manager
            .get_fallback_policy()
            .await
            .map_err(|e| format!("读取兜底策略失败: {}", e))?;

        let conversion_service = Arc::new(build_conversion_service(config_manager.as_ref()).await?);
        let engine = CostingEngine::new(policy).with_locale(locale.clone());

        // ==========================================
        // 初始化导入层
        // ==========================================
        let validator = ImportValidator::new(UnitCatalog::new()).with_locale(locale.clone());
        let importer = Arc::new(
            PriceImporterImpl::new(price_repo.clone(), validator.clone())
                .map_err(|e| format!("无法创建PriceImporter: {}", e))?,
        );

        // ==========================================
        // 初始化API层
        // ==========================================
        let price_database_api = Arc::new(PriceDatabaseApi::new(
            price_repo.clone(),
            importer,
            validator,
            quota.clone(),
        ));

        let converter: Arc<dyn UnitConverter> = conversion_service.clone();
        let workbook_api = Arc::new(
            WorkbookApi::new(
                workbook_repo,
                price_repo,
                config_manager.clone(),
                converter,
                engine,
                quota,
            )
            .with_locale(locale),
        );

        tracing::info!(
            remote_conversion = conversion_service.has_remote(),
            policy = ?policy,
            "AppState初始化完成"
        );

        Ok(Self {
            db_path,
            config_manager,
            conversion_service,
            units_api: UnitsApi::new(UnitCatalog::new()),
            price_database_api,
            workbook_api,
        })
    }
}

/// 按配置构建换算服务
async fn build_conversion_service(config: &ConfigManager) -> Result<UnitConversionService, String> {
    let settings = config
        .get_rapidapi_settings()
        .await
        .map_err(|e| format!("读取换算服务配置失败: {}", e))?;
    let timeout_ms = config
        .get_conversion_timeout_ms()
        .await
        .map_err(|e| format!("读取换算超时失败: {}", e))?;

    if !settings.is_complete() {
        tracing::warn!("远程换算服务参数不全，仅使用本地比例表");
        return Ok(UnitConversionService::offline());
    }

    let provider: Arc<dyn ConversionProvider> = Arc::new(
        RapidApiProvider::new(settings).map_err(|e| format!("无法创建换算服务客户端: {}", e))?,
    );
    Ok(UnitConversionService::new(
        provider,
        Duration::from_millis(timeout_ms),
    ))
}

/// 获取默认数据库路径
///
/// 优先读取环境变量 COSTING_DB_PATH，其次为用户数据目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(env_keys::DB_PATH) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./costing.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("costing-engine");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("costing.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::config_keys;
    use crate::engine::costing::FallbackPolicy;

    #[tokio::test]
    async fn test_app_state_on_memory_database() {
        let state = AppState::new(":memory:".to_string()).await.unwrap();

        assert!(state.units_api.validate_unit("gram").is_valid);
        assert!(state.price_database_api.list(1).unwrap().is_empty());
        assert!(state.workbook_api.list_summaries(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_incomplete_settings_build_offline_service() {
        let conn = crate::db::open_and_migrate(":memory:").unwrap();
        let config = ConfigManager::from_connection(Arc::new(Mutex::new(conn)))
            .unwrap()
            .without_env_overrides();
        config
            .set_global_config_value(config_keys::RAPIDAPI_HOST, "unitconv.example")
            .unwrap();
        config
            .set_global_config_value(config_keys::CONVERSION_FALLBACK_POLICY, FallbackPolicy::Reject.to_db_str())
            .unwrap();

        let service = build_conversion_service(&config).await.unwrap();
        assert!(!service.has_remote());
        assert_eq!(config.get_fallback_policy().await.unwrap(), FallbackPolicy::Reject);
    }
}
