// ==========================================
// 配方成本核算系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、值对象、核算结果
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod catalog;
pub mod costing;
pub mod import;
pub mod unit;
pub mod workbook;

// 重导出核心类型
pub use catalog::{CatalogItem, NewPriceItem, PriceDatabase};
pub use costing::{CostBreakdown, LineConversion, LineCost, WorkbookDetail, WorkbookSummary};
pub use import::{ImportValidationResult, RawRow, RowError};
pub use unit::{UnitCategory, UnitInfo};
pub use workbook::{EntityStatus, Workbook, WorkbookLine, WorkbookParams};
