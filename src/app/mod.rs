// ==========================================
// 配方成本核算系统 - 应用层
// ==========================================
// 职责: 按数据库路径装配仓储、配置、换算服务与 API
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
