// ==========================================
// 配方成本核算系统 - 计量单位领域模型
// ==========================================
// 用途: 单位目录（UnitCatalog）的静态条目
// 生命周期: 进程级只读，启动后不可变
// ==========================================

use serde::Serialize;

// ==========================================
// UnitInfo - 单位信息
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitInfo {
    pub api_code: &'static str,     // 换算服务使用的代码（如 "kilogram"）
    pub display_name: &'static str, // 显示名称（如 "Kilogramo"）
    pub symbol: &'static str,       // 符号（如 "kg"，可为空）
}

impl UnitInfo {
    pub const fn new(api_code: &'static str, display_name: &'static str, symbol: &'static str) -> Self {
        Self {
            api_code,
            display_name,
            symbol,
        }
    }
}

// ==========================================
// UnitCategory - 单位分类
// ==========================================
// 分类顺序即目录展示顺序
#[derive(Debug, Clone, Copy, Serialize)]
pub struct UnitCategory {
    pub name: &'static str,
    pub units: &'static [UnitInfo],
}
