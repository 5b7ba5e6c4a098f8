// ==========================================
// 配方成本核算系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod decimal_sql;
pub mod error;
pub mod price_database_repo;
pub mod workbook_repo;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use price_database_repo::PriceDatabaseRepository;
pub use workbook_repo::WorkbookRepository;
