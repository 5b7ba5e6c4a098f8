// ==========================================
// 端到端测试: 导入价格库 → 建配方 → 成本明细
// ==========================================
// 测试目标: AppState 装配后的完整业务流（本地比例表换算）
// ==========================================

mod helpers;

use costing_engine::api::{ApiError, FixedQuota};
use costing_engine::app::AppState;
use costing_engine::config::config_keys;
use costing_engine::domain::costing::LineConversion;
use costing_engine::domain::EntityStatus;
use costing_engine::engine::FallbackPolicy;
use costing_engine::logging;
use helpers::test_data_builder::{dec, LineBuilder, ParamsBuilder};
use std::sync::Arc;
use test_helpers::{create_test_db, write_price_csv, PRICE_HEADER};

async fn seeded_state(db_path: &str, owner_id: i64) -> (AppState, Vec<i64>) {
    let state = AppState::new(db_path.to_string()).await.unwrap();
    let file = write_price_csv(&[
        PRICE_HEADER,
        "H1,Harina,20,kilogram",
        "L1,Leche,4,liter",
        "V1,Vainilla,3,unidad_inexistente_no",
    ])
    .unwrap();

    // 第三行单位无效，整批不落库
    let outcome = state
        .price_database_api
        .upload(owner_id, "Mercado", file.path())
        .await
        .unwrap();
    assert!(!outcome.is_persisted());
    assert_eq!(outcome.validation.errors[0].row, 4);

    let file = write_price_csv(&[PRICE_HEADER, "H1,Harina,20,kilogram", "L1,Leche,4,liter"]).unwrap();
    let outcome = state
        .price_database_api
        .upload(owner_id, "Mercado", file.path())
        .await
        .unwrap();
    let database = outcome.database.unwrap();

    let item_ids = state
        .price_database_api
        .list_items(owner_id, database.id)
        .unwrap()
        .iter()
        .map(|item| item.id)
        .collect();
    (state, item_ids)
}

#[tokio::test]
async fn test_full_costing_flow() {
    logging::init_test();
    let (_db_file, db_path) = create_test_db().unwrap();
    let (state, items) = seeded_state(&db_path, 1).await;

    let params = ParamsBuilder::new()
        .units("4")
        .tax("0.1")
        .margin("0.5")
        .operational("0.2", "3")
        .target("20")
        .build();
    let workbook = state
        .workbook_api
        .create(1, "Pastel", Some(params))
        .await
        .unwrap();

    state
        .workbook_api
        .add_line(1, workbook.id, &LineBuilder::new(items[0]).quantity("1500").unit("GRAM").build())
        .unwrap();
    state
        .workbook_api
        .add_line(
            1,
            workbook.id,
            &LineBuilder::new(items[1]).quantity("250").unit("milliliter").additional("2").build(),
        )
        .unwrap();

    let detail = state.workbook_api.get_detail(1, workbook.id).await.unwrap();
    let breakdown = &detail.breakdown;
    assert_eq!(breakdown.lines.len(), 2);
    assert_eq!(breakdown.lines[0].conversion, LineConversion::Converted { factor: dec("1000") });
    assert_eq!(breakdown.total_cost, dec("46.86"));
    assert_eq!(breakdown.unit_cost, dec("11.715"));
    assert_eq!(breakdown.suggested_price, dec("17.5725"));
    assert_eq!(breakdown.total_weight_grams, dec("1500"));

    let json = serde_json::to_value(&detail).unwrap();
    assert_eq!(json["weightUnit"], "g");
    assert!(json.get("totalCost").is_some());
    assert_eq!(json["lines"].as_array().map(Vec::len), Some(2));

    state.workbook_api.publish(1, workbook.id).unwrap();
    let summaries = state.workbook_api.list_summaries(1).await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].status, EntityStatus::Published);
    assert_eq!(summaries[0].selling_price, dec("17.5725"));
}

#[tokio::test]
async fn test_deleting_price_database_removes_dependent_lines() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let (state, items) = seeded_state(&db_path, 1).await;
    let workbook = state.workbook_api.create(1, "Pan", None).await.unwrap();
    state
        .workbook_api
        .add_line(1, workbook.id, &LineBuilder::new(items[0]).build())
        .unwrap();

    let database_id = state.price_database_api.list(1).unwrap()[0].id;
    state.price_database_api.delete(1, database_id).unwrap();

    let detail = state.workbook_api.get_detail(1, workbook.id).await.unwrap();
    assert!(detail.breakdown.lines.is_empty());
}

#[tokio::test]
async fn test_other_users_cannot_touch_resources() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let (state, items) = seeded_state(&db_path, 1).await;
    let workbook = state.workbook_api.create(1, "Pan", None).await.unwrap();

    assert!(matches!(
        state.workbook_api.get_detail(2, workbook.id).await,
        Err(ApiError::Forbidden(_))
    ));

    let foreign = state.workbook_api.create(2, "Ajeno", None).await.unwrap();
    assert!(matches!(
        state
            .workbook_api
            .add_line(2, foreign.id, &LineBuilder::new(items[0]).build()),
        Err(ApiError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_reject_policy_from_config() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let (state, items) = seeded_state(&db_path, 1).await;
    state
        .config_manager
        .set_global_config_value(
            config_keys::CONVERSION_FALLBACK_POLICY,
            FallbackPolicy::Reject.to_db_str(),
        )
        .unwrap();

    // 重新装配后读取新策略
    let state = AppState::new(db_path.clone()).await.unwrap();
    let workbook = state.workbook_api.create(1, "Mixto", None).await.unwrap();
    state
        .workbook_api
        .add_line(1, workbook.id, &LineBuilder::new(items[1]).unit("kilogram").build())
        .unwrap();

    let err = state.workbook_api.get_detail(1, workbook.id).await.unwrap_err();
    assert!(matches!(err, ApiError::CostingError(msg) if msg.contains("liter -> kilogram")));
}

#[tokio::test]
async fn test_quota_limits_price_databases() {
    let (_db_file, db_path) = create_test_db().unwrap();
    let state = AppState::with_quota(
        db_path,
        Arc::new(FixedQuota {
            max_price_databases: 1,
            max_workbooks: 5,
        }),
    )
    .await
    .unwrap();

    state.price_database_api.create(1, "Uno", None).unwrap();
    assert!(matches!(
        state.price_database_api.create(1, "Dos", None),
        Err(ApiError::QuotaExceeded(_))
    ));
    // 其他用户独立计数
    assert!(state.price_database_api.create(2, "Uno", None).is_ok());
}
