// ==========================================
// 配方成本核算系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口，供传输层（HTTP/CLI）调用
// ==========================================

pub mod error;
pub mod price_database_api;
pub mod quota;
pub mod units_api;
pub mod workbook_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use price_database_api::PriceDatabaseApi;
pub use quota::{FixedQuota, QuotaResource, SubscriptionQuota, UnlimitedQuota};
pub use units_api::{UnitValidation, UnitsApi};
pub use workbook_api::WorkbookApi;
