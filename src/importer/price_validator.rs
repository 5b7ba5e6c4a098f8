// ==========================================
// 配方成本核算系统 - 价格导入校验器
// ==========================================
// 职责: 原始数据行 → 合格价格条目 + 行级错误报告
// 规则:
// - Producto 非空
// - Precio 可解析且 > 0（两条错误互斥）
// - Unidad 在单位目录内（不区分大小写）
// - ID 非空时不得重复（不区分大小写），重复项引用首次出现的行号
// 红线: 行错误是数据，不中断整批校验；同一行的多条错误全部保留
// ==========================================

use crate::domain::catalog::NewPriceItem;
use crate::domain::import::{
    ImportValidationResult, RawRow, RowError, COLUMN_EXTERNAL_ID, COLUMN_PRICE, COLUMN_PRODUCT,
    COLUMN_UNIT,
};
use crate::engine::unit_catalog::UnitCatalog;
use crate::i18n;
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::price_importer_trait::DataCleaner as DataCleanerTrait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ImportValidator {
    catalog: UnitCatalog,
    cleaner: DataCleaner,
    locale: String,
}

impl Default for ImportValidator {
    fn default() -> Self {
        Self::new(UnitCatalog::new())
    }
}

impl ImportValidator {
    pub fn new(catalog: UnitCatalog) -> Self {
        Self {
            catalog,
            cleaner: DataCleaner,
            locale: i18n::DEFAULT_LOCALE.to_string(),
        }
    }

    /// 错误消息语言
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    fn message(&self, key: &str, args: &[(&str, &str)]) -> String {
        i18n::tr(&self.locale, key, args)
    }

    fn row_error(&self, row: usize, column: &str, raw_value: &str, key: &str) -> RowError {
        self.row_error_with(row, column, raw_value, key, &[])
    }

    fn row_error_with(
        &self,
        row: usize,
        column: &str,
        raw_value: &str,
        key: &str,
        args: &[(&str, &str)],
    ) -> RowError {
        RowError {
            row,
            column: column.to_string(),
            raw_value: raw_value.to_string(),
            message: self.message(key, args),
        }
    }

    /// 校验一批原始数据行
    pub fn validate(&self, rows: &[RawRow]) -> ImportValidationResult {
        let mut errors = Vec::new();
        let mut valid_items = Vec::new();
        // 规范化 ID → 首次出现的行号
        let mut seen_ids: HashMap<String, usize> = HashMap::new();

        for row in rows {
            let mut row_errors: Vec<RowError> =
                self.check_product(row.row_number, &row.product).into_iter().collect();

            let price = match self.cleaner.parse_price(&row.price_text) {
                None => {
                    row_errors.push(self.row_error(
                        row.row_number,
                        COLUMN_PRICE,
                        &row.price_text,
                        "validation.price_not_numeric",
                    ));
                    None
                }
                Some(p) if p <= Decimal::ZERO => {
                    row_errors.push(self.row_error(
                        row.row_number,
                        COLUMN_PRICE,
                        &row.price_text,
                        "validation.price_not_positive",
                    ));
                    None
                }
                Some(p) => Some(p),
            };

            row_errors.extend(self.check_unit(row.row_number, &row.unit));

            let external_id = self.cleaner.normalize_null(&row.external_id);
            if let Some(id) = &external_id {
                let key = id.to_lowercase();
                match seen_ids.get(&key) {
                    Some(first_row) => {
                        row_errors.push(self.row_error_with(
                            row.row_number,
                            COLUMN_EXTERNAL_ID,
                            &row.external_id,
                            "validation.duplicate_id",
                            &[("id", id.as_str()), ("row", &first_row.to_string())],
                        ));
                    }
                    None => {
                        seen_ids.insert(key, row.row_number);
                    }
                }
            }

            match (row_errors.is_empty(), price, self.catalog.canonical_code(&row.unit)) {
                (true, Some(price), Some(unit)) => valid_items.push(NewPriceItem {
                    external_id,
                    product: self.cleaner.clean_text(&row.product),
                    price,
                    unit: unit.to_string(),
                }),
                _ => {
                    debug!(row = row.row_number, errors = row_errors.len(), "数据行校验未通过");
                    errors.extend(row_errors);
                }
            }
        }

        let is_valid = errors.is_empty() && !valid_items.is_empty();

        ImportValidationResult {
            is_valid,
            total_rows: rows.len(),
            errors,
            valid_items,
        }
    }

    /// 校验手工录入的条目（规则同导入，行号记为 0）
    ///
    /// 通过时返回规范化后的条目（去空白、单位取目录拼写）
    pub fn validate_item(&self, item: &NewPriceItem) -> Result<NewPriceItem, Vec<RowError>> {
        let mut errors: Vec<RowError> = self.check_product(0, &item.product).into_iter().collect();
        if item.price <= Decimal::ZERO {
            errors.push(self.row_error(
                0,
                COLUMN_PRICE,
                &item.price.to_string(),
                "validation.price_not_positive",
            ));
        }
        errors.extend(self.check_unit(0, &item.unit));

        match self.catalog.canonical_code(&item.unit) {
            Some(unit) if errors.is_empty() => Ok(NewPriceItem {
                external_id: item
                    .external_id
                    .as_deref()
                    .and_then(|id| self.cleaner.normalize_null(id)),
                product: self.cleaner.clean_text(&item.product),
                price: item.price,
                unit: unit.to_string(),
            }),
            _ => Err(errors),
        }
    }

    fn check_product(&self, row: usize, product: &str) -> Option<RowError> {
        self.cleaner
            .normalize_null(product)
            .is_none()
            .then(|| self.row_error(row, COLUMN_PRODUCT, product, "validation.product_required"))
    }

    fn check_unit(&self, row: usize, unit: &str) -> Option<RowError> {
        (!self.catalog.is_valid_unit(unit))
            .then(|| self.row_error(row, COLUMN_UNIT, unit, "validation.invalid_unit"))
    }
}
