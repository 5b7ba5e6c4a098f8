// ==========================================
// 配方成本核算系统 - 引擎层
// ==========================================
// 职责: 单位目录、单位换算、成本核算
// 红线: Engine 不拼 SQL，核算期间不回读存储
// ==========================================

pub mod conversion;
pub mod costing;
pub mod unit_catalog;

// 重导出核心引擎
pub use conversion::{
    ConversionProvider, RapidApiProvider, RapidApiSettings, UnitConversionService, UnitConverter,
};
pub use costing::{CatalogLookup, CostingEngine, CostingError, CostingResult, FallbackPolicy};
pub use unit_catalog::{normalize_unit_code, UnitCatalog};
