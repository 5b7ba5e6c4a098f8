// ==========================================
// 配方成本核算系统 - 计量单位 API
// ==========================================
// 职责: 单位目录查询、单位校验
// ==========================================

use serde::Serialize;

use crate::domain::unit::{UnitCategory, UnitInfo};
use crate::engine::unit_catalog::UnitCatalog;

/// 单位校验结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitValidation {
    pub unit: String,
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<UnitInfo>,
}

// ==========================================
// UnitsApi - 计量单位 API
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitsApi {
    catalog: UnitCatalog,
}

impl UnitsApi {
    pub fn new(catalog: UnitCatalog) -> Self {
        Self { catalog }
    }

    /// 按分类组织的完整目录
    pub fn catalog(&self) -> &'static [UnitCategory] {
        self.catalog.categories()
    }

    /// 全部有效单位代码（按字母序）
    pub fn valid_units(&self) -> Vec<&'static str> {
        self.catalog.valid_units()
    }

    /// 校验单个单位代码（原样回显输入）
    pub fn validate_unit(&self, code: &str) -> UnitValidation {
        let info = self.catalog.get_unit_info(code).copied();
        UnitValidation {
            unit: code.to_string(),
            is_valid: info.is_some(),
            info,
        }
    }
}
