// ==========================================
// 配方成本核算系统 - API 层错误类型
// ==========================================
// 职责: 统一 API 层错误面，将仓储/导入/核算错误转换为面向调用方的错误
// ==========================================

use crate::domain::import::RowError;
use crate::engine::costing::CostingError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API 层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入与权限
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("无权访问: {0}")]
    Forbidden(String),

    #[error("配额不足: {0}")]
    QuotaExceeded(String),

    /// 条目校验失败（携带逐字段错误）
    #[error("数据验证失败: {} 项错误", .0.len())]
    ValidationError(Vec<RowError>),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 核算
    // ==========================================
    #[error("成本核算失败: {0}")]
    CostingError(String),

    // ==========================================
    // 数据访问
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    // ==========================================
    // 导入
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    // ==========================================
    // 通用
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg)
            | RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::Repository(repo_err) => ApiError::from(repo_err),
            ImportError::MissingSourceUrl(id) => {
                ApiError::InvalidInput(format!("价格库(id={})没有远程来源地址", id))
            }
            ImportError::Other(err) => ApiError::Other(err),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

// ==========================================
// 从 CostingError 转换
// ==========================================
impl From<CostingError> for ApiError {
    fn from(err: CostingError) -> Self {
        match err {
            CostingError::CatalogItemNotFound { catalog_item_id } => {
                ApiError::NotFound(format!("PriceItem(id={})不存在", catalog_item_id))
            }
            CostingError::UnresolvedConversions(ref unresolved) => {
                let lines = unresolved
                    .iter()
                    .map(|u| u.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                ApiError::CostingError(format!("{}: {}", err, lines))
            }
            CostingError::LineOverflow { .. } | CostingError::TotalsOverflow => {
                ApiError::InvalidInput(err.to_string())
            }
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::costing::UnresolvedConversion;

    #[test]
    fn test_repository_not_found_maps_to_not_found() {
        let err: ApiError = RepositoryError::not_found("Workbook", 7).into();
        assert!(matches!(err, ApiError::NotFound(msg) if msg.contains("Workbook(id=7)")));
    }

    #[test]
    fn test_import_error_unwraps_repository_error() {
        let err: ApiError = ImportError::Repository(RepositoryError::not_found("PriceDatabase", 3)).into();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err: ApiError = ImportError::UnsupportedFormat("pdf".to_string()).into();
        assert!(matches!(err, ApiError::ImportError(_)));
    }

    #[test]
    fn test_unresolved_conversions_lists_lines() {
        let err: ApiError = CostingError::UnresolvedConversions(vec![UnresolvedConversion {
            line_index: 1,
            catalog_item_id: 4,
            from_unit: "liter".to_string(),
            to_unit: "kilogram".to_string(),
        }])
        .into();

        match err {
            ApiError::CostingError(msg) => assert!(msg.contains("#2 (item 4): liter -> kilogram")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_costing_overflow_maps_to_invalid_input() {
        let err: ApiError = CostingError::LineOverflow { line_index: 2 }.into();
        assert!(matches!(err, ApiError::InvalidInput(msg) if msg.contains("#3")));

        let err: ApiError = CostingError::TotalsOverflow.into();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }
}
