// ==========================================
// 配方成本核算系统 - 价格库领域模型
// ==========================================
// 对齐: price_database / price_item 表
// 用途: 导入层写入，核算引擎只读
// ==========================================

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// PriceDatabase - 价格库（一次导入或手工建立的价格清单）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceDatabase {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub source_url: Option<String>, // 远程来源（支持 refresh）
    pub upload_date: DateTime<Utc>,
    pub item_count: i64,
}

// ==========================================
// CatalogItem - 价格条目（已落库）
// ==========================================
// 红线: price > 0，unit 必须是目录内的单位代码
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: i64,
    pub price_database_id: i64,
    pub external_id: Option<String>, // 外部编号（同一价格库内唯一，不区分大小写）
    pub product: String,
    pub price: Decimal, // 每个 unit 的价格
    pub unit: String,
}

// ==========================================
// NewPriceItem - 校验通过、尚未分配标识的价格条目
// ==========================================
// 用途: 导入校验输出 / 手工新增输入，由仓储分配 id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPriceItem {
    pub external_id: Option<String>,
    pub product: String,
    pub price: Decimal,
    pub unit: String,
}

impl NewPriceItem {
    /// 绑定仓储分配的标识，得到落库后的条目
    pub fn into_catalog_item(self, id: i64, price_database_id: i64) -> CatalogItem {
        CatalogItem {
            id,
            price_database_id,
            external_id: self.external_id,
            product: self.product,
            price: self.price,
            unit: self.unit,
        }
    }
}
