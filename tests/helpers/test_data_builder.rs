// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use costing_engine::domain::{CatalogItem, WorkbookLine, WorkbookParams};
use rust_decimal::Decimal;
use std::str::FromStr;

/// 文本转 Decimal（测试数据书写方便）
pub fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

// ==========================================
// CatalogItem 构建器
// ==========================================

pub struct CatalogItemBuilder {
    id: i64,
    product: String,
    price: Decimal,
    unit: String,
}

impl CatalogItemBuilder {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            product: format!("Producto {}", id),
            price: Decimal::ONE,
            unit: "kilogram".to_string(),
        }
    }

    pub fn product(mut self, product: &str) -> Self {
        self.product = product.to_string();
        self
    }

    pub fn price(mut self, price: &str) -> Self {
        self.price = dec(price);
        self
    }

    pub fn unit(mut self, unit: &str) -> Self {
        self.unit = unit.to_string();
        self
    }

    pub fn build(self) -> CatalogItem {
        CatalogItem {
            id: self.id,
            price_database_id: 1,
            external_id: None,
            product: self.product,
            price: self.price,
            unit: self.unit,
        }
    }
}

// ==========================================
// WorkbookLine 构建器
// ==========================================

pub struct LineBuilder {
    catalog_item_id: i64,
    quantity: Decimal,
    unit: String,
    additional_cost: Decimal,
}

impl LineBuilder {
    pub fn new(catalog_item_id: i64) -> Self {
        Self {
            catalog_item_id,
            quantity: Decimal::ONE,
            unit: "kilogram".to_string(),
            additional_cost: Decimal::ZERO,
        }
    }

    pub fn quantity(mut self, quantity: &str) -> Self {
        self.quantity = dec(quantity);
        self
    }

    pub fn unit(mut self, unit: &str) -> Self {
        self.unit = unit.to_string();
        self
    }

    pub fn additional(mut self, cost: &str) -> Self {
        self.additional_cost = dec(cost);
        self
    }

    pub fn build(self) -> WorkbookLine {
        WorkbookLine {
            id: None,
            catalog_item_id: self.catalog_item_id,
            quantity: self.quantity,
            unit: self.unit,
            additional_cost: self.additional_cost,
        }
    }
}

// ==========================================
// WorkbookParams 构建器（默认全部为零，产出 1 份）
// ==========================================

pub struct ParamsBuilder {
    params: WorkbookParams,
}

impl ParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: WorkbookParams {
                production_units: Decimal::ONE,
                tax_percentage: Decimal::ZERO,
                profit_margin_percentage: Decimal::ZERO,
                target_sale_price: None,
                operational_cost_percentage: Decimal::ZERO,
                operational_cost_fixed: Decimal::ZERO,
            },
        }
    }

    pub fn units(mut self, units: &str) -> Self {
        self.params.production_units = dec(units);
        self
    }

    pub fn tax(mut self, tax: &str) -> Self {
        self.params.tax_percentage = dec(tax);
        self
    }

    pub fn margin(mut self, margin: &str) -> Self {
        self.params.profit_margin_percentage = dec(margin);
        self
    }

    pub fn target(mut self, target: &str) -> Self {
        self.params.target_sale_price = Some(dec(target));
        self
    }

    pub fn operational(mut self, percentage: &str, fixed: &str) -> Self {
        self.params.operational_cost_percentage = dec(percentage);
        self.params.operational_cost_fixed = dec(fixed);
        self
    }

    pub fn build(self) -> WorkbookParams {
        self.params
    }
}
