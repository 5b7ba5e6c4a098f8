// ==========================================
// 配方成本核算系统 - 十进制数存取
// ==========================================
// 约定: Decimal 以规范化字符串写入 TEXT 列，读取时严格解析
// ==========================================

use rusqlite::types::Type;
use rusqlite::Row;
use rust_decimal::Decimal;
use std::str::FromStr;

/// 写入用文本
pub fn to_sql_text(value: Decimal) -> String {
    value.normalize().to_string()
}

/// 读取 TEXT 列为 Decimal
pub fn get_decimal(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let text: String = row.get(idx)?;
    parse(idx, &text)
}

/// 读取可空 TEXT 列为 Option<Decimal>
pub fn get_optional_decimal(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|t| parse(idx, &t)).transpose()
}

fn parse(idx: usize, text: &str) -> rusqlite::Result<Decimal> {
    Decimal::from_str(text.trim())
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
