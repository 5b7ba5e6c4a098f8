// ==========================================
// 价格导入集成测试
// ==========================================
// 测试目标: 行级多错误诊断、重复 ID、CSV 行号、校验通过才落库
// ==========================================


use costing_engine::domain::RawRow;
use costing_engine::importer::{
    FileParser, ImportError, ImportValidator, PriceImporter, PriceImporterImpl,
    UniversalFileParser,
};
use costing_engine::logging;
use costing_engine::repository::PriceDatabaseRepository;
use rust_decimal::Decimal;
use std::path::Path;
use std::sync::Arc;
use test_helpers::{create_test_db, write_price_csv, PRICE_HEADER};

fn validator() -> ImportValidator {
    ImportValidator::default().with_locale("en")
}

fn rows(data: Vec<(&str, &str, &str, &str)>) -> Vec<RawRow> {
    RawRow::from_tuples(data)
}

// ==========================================
// ImportValidator
// ==========================================

#[test]
fn test_single_well_formed_row() {
    let result = validator().validate(&rows(vec![("A1", "Harina", "10", "kilogram")]));

    assert!(result.is_valid);
    assert_eq!(result.total_rows, 1);
    assert_eq!(result.valid_items.len(), 1);
    assert!(result.errors.is_empty());
}

#[test]
fn test_non_numeric_price_reports_exactly_one_error() {
    let result = validator().validate(&rows(vec![
        ("A1", "Harina", "10", "kilogram"),
        ("A2", "Leche", "abc", "liter"),
    ]));

    assert!(!result.is_valid);
    assert_eq!(result.valid_items.len(), 1);
    assert_eq!(result.errors.len(), 1);
    let error = &result.errors[0];
    assert_eq!(error.row, 3);
    assert_eq!(error.column, "Precio");
    assert_eq!(error.raw_value, "abc");
    assert_eq!(error.message, "Price must be a valid number");
}

#[test]
fn test_all_errors_of_a_row_are_kept_in_column_order() {
    let result = validator().validate(&rows(vec![("", " ", "-3", "cup")]));

    let columns: Vec<&str> = result.errors.iter().map(|e| e.column.as_str()).collect();
    assert_eq!(columns, vec!["Producto", "Precio", "Unidad"]);
    assert!(result.errors.iter().all(|e| e.row == 2));
    assert_eq!(result.errors[1].message, "Price must be greater than zero");
}

#[test]
fn test_duplicate_id_references_first_row() {
    let result = validator().validate(&rows(vec![
        ("X1", "Harina", "10", "kilogram"),
        ("B2", "Azucar", "8", "kilogram"),
        ("x1", "Sal", "2", "kilogram"),
    ]));

    assert_eq!(result.valid_items.len(), 2);
    assert_eq!(result.valid_items[0].external_id.as_deref(), Some("X1"));
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].row, 4);
    assert_eq!(result.errors[0].column, "ID");
    assert_eq!(result.errors[0].message, "ID 'x1' is duplicated from row 2");
}

#[test]
fn test_blank_ids_are_never_duplicates() {
    let result = validator().validate(&rows(vec![
        ("", "Harina", "10", "kilogram"),
        ("  ", "Azucar", "8", "kilogram"),
    ]));

    assert!(result.is_valid);
    assert!(result.valid_items.iter().all(|item| item.external_id.is_none()));
}

#[test]
fn test_zero_rows_is_not_valid() {
    let result = validator().validate(&[]);

    assert!(!result.is_valid);
    assert_eq!(result.total_rows, 0);
    assert!(result.errors.is_empty());
    assert!(result.valid_items.is_empty());
}

#[test]
fn test_default_messages_are_spanish() {
    let result = ImportValidator::default().validate(&rows(vec![("A1", "", "10", "kilogram")]));
    assert!(result.errors[0].message.starts_with("El "), "{}", result.errors[0].message);
}

#[test]
fn test_valid_items_are_normalized() {
    let result = validator().validate(&rows(vec![(" A1 ", "  Harina 000 ", "1.5E1", "KILOGRAM")]));

    let item = &result.valid_items[0];
    assert_eq!(item.external_id.as_deref(), Some("A1"));
    assert_eq!(item.product, "Harina 000");
    assert_eq!(item.price, Decimal::new(15, 0));
    assert_eq!(item.unit, "kilogram");
}

// ==========================================
// 文件解析
// ==========================================

#[test]
fn test_csv_rows_keep_sheet_row_numbers() {
    let file = write_price_csv(&[
        PRICE_HEADER,
        "A1,Harina,10,kilogram",
        ",,,",
        "A2,Leche,abc,liter",
    ])
    .unwrap();

    let parsed = UniversalFileParser.parse_rows(file.path()).unwrap();
    // 空行被跳过，但行号保持表格行号
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[0].row_number, 2);
    assert_eq!(parsed[1].row_number, 4);

    let result = validator().validate(&parsed);
    assert_eq!(result.errors[0].row, 4);
}

#[test]
fn test_unsupported_and_missing_files() {
    let err = UniversalFileParser
        .parse_rows(Path::new("/definitely/not/here/precios.csv"))
        .unwrap_err();
    assert!(matches!(err, ImportError::FileNotFound(_)));

    let file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
    let err = UniversalFileParser.parse_rows(file.path()).unwrap_err();
    assert!(matches!(err, ImportError::UnsupportedFormat(_)));
}

// ==========================================
// 导入流程（临时数据库）
// ==========================================

fn importer(db_path: &str) -> (PriceImporterImpl, Arc<PriceDatabaseRepository>) {
    let repo = Arc::new(PriceDatabaseRepository::new(db_path).unwrap());
    (PriceImporterImpl::new(repo.clone(), validator()).unwrap(), repo)
}

#[tokio::test]
async fn test_import_persists_only_valid_batches() {
    logging::init_test();
    let (_db_file, db_path) = create_test_db().unwrap();
    let (importer, repo) = importer(&db_path);

    let bad = write_price_csv(&[PRICE_HEADER, "A1,Harina,10,kilogram", "A2,,0,cup"]).unwrap();
    let outcome = importer.import_file(9, "Proveedor", bad.path()).await.unwrap();
    assert!(!outcome.is_persisted());
    assert_eq!(outcome.validation.error_count(), 3);
    assert_eq!(repo.count_by_owner(9).unwrap(), 0);

    let good = write_price_csv(&[PRICE_HEADER, "A1,Harina,10,kilogram", "A2,Leche,2.5,LITER"]).unwrap();
    let outcome = importer.import_file(9, "Proveedor", good.path()).await.unwrap();
    let database = outcome.database.unwrap();
    assert_eq!(database.item_count, 2);

    let items = repo.list_items(database.id).unwrap();
    assert_eq!(items[1].unit, "liter");
    assert_eq!(items[1].price, Decimal::new(25, 1));
}

#[tokio::test]
async fn test_validate_file_is_a_dry_run() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let (importer, repo) = importer(&db_path);
    let file = write_price_csv(&[PRICE_HEADER, "A1,Harina,10,kilogram"]).unwrap();

    let result = importer.validate_file(file.path()).await.unwrap();

    assert!(result.is_valid);
    assert_eq!(repo.count_by_owner(9).unwrap(), 0);
}
