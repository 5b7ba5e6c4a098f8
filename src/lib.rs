// ==========================================
// 配方成本核算系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + 远程单位换算服务
// 系统定位: 价格库导入、配方成本拆解、建议售价
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "es");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与值对象
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 单位目录 / 单位换算 / 成本核算
pub mod engine;

// 导入层 - 外部价格表
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    CatalogItem, CostBreakdown, EntityStatus, ImportValidationResult, LineCost, NewPriceItem,
    PriceDatabase, RawRow, RowError, UnitInfo, Workbook, WorkbookDetail, WorkbookLine,
    WorkbookParams, WorkbookSummary,
};

// 引擎
pub use engine::{
    CostingEngine, CostingError, FallbackPolicy, UnitCatalog, UnitConversionService,
    UnitConverter,
};

// 导入
pub use importer::{ImportValidator, PriceImporter, PriceImporterImpl};

// API
pub use api::{ApiError, ApiResult, PriceDatabaseApi, UnitsApi, WorkbookApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "配方成本核算系统";
