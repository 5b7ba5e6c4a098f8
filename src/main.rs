// ==========================================
// 配方成本核算系统 - 开发命令行入口
// ==========================================
// 用法:
//   costing-engine units [code]
//   costing-engine validate <file>
//   costing-engine import <owner_id> <name> <file>
//   costing-engine import-url <owner_id> <name> <url>
//   costing-engine refresh <owner_id> <price_database_id>
//   costing-engine workbooks <owner_id>
//   costing-engine workbook <owner_id> <workbook_id>
//   costing-engine config
//
// 数据库路径: COSTING_DB_PATH，未设置时使用用户数据目录
// 日志格式: COSTING_LOG_FORMAT=json 输出 JSON 日志
// ==========================================

use std::error::Error;
use std::path::Path;

use costing_engine::app::{get_default_db_path, AppState};
use costing_engine::logging;
use serde::Serialize;

const USAGE: &str = "用法: costing-engine <units|validate|import|import-url|refresh|workbooks|workbook|config> [参数...]";

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn next_arg(args: &mut impl Iterator<Item = String>, name: &str) -> Result<String, Box<dyn Error>> {
    args.next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("缺少参数: {}\n{}", name, USAGE).into())
}

fn next_id(args: &mut impl Iterator<Item = String>, name: &str) -> Result<i64, Box<dyn Error>> {
    let raw = next_arg(args, name)?;
    raw.parse::<i64>()
        .map_err(|_| format!("参数 {} 不是整数: {}", name, raw).into())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    logging::init_with_format(logging::LogFormat::from_env(), "warn");

    let mut args = std::env::args().skip(1);
    let command = next_arg(&mut args, "command")?;

    // 单位目录不需要数据库
    if command == "units" {
        let units = costing_engine::UnitsApi::default();
        return match args.next() {
            Some(code) => print_json(&units.validate_unit(&code)),
            None => print_json(&units.catalog()),
        };
    }

    let db_path = get_default_db_path();
    tracing::info!(db_path = %db_path, version = costing_engine::VERSION, "{}", costing_engine::APP_NAME);
    let state = AppState::new(db_path).await?;

    match command.as_str() {
        "validate" => {
            let file = next_arg(&mut args, "file")?;
            let result = state.price_database_api.validate_file(Path::new(&file)).await?;
            print_json(&result)
        }
        "import" => {
            let owner_id = next_id(&mut args, "owner_id")?;
            let name = next_arg(&mut args, "name")?;
            let file = next_arg(&mut args, "file")?;
            let outcome = state
                .price_database_api
                .upload(owner_id, &name, Path::new(&file))
                .await?;
            print_json(&outcome)
        }
        "import-url" => {
            let owner_id = next_id(&mut args, "owner_id")?;
            let name = next_arg(&mut args, "name")?;
            let url = next_arg(&mut args, "url")?;
            let outcome = state
                .price_database_api
                .import_from_url(owner_id, &name, &url)
                .await?;
            print_json(&outcome)
        }
        "refresh" => {
            let owner_id = next_id(&mut args, "owner_id")?;
            let price_database_id = next_id(&mut args, "price_database_id")?;
            let outcome = state
                .price_database_api
                .refresh(owner_id, price_database_id)
                .await?;
            print_json(&outcome)
        }
        "workbooks" => {
            let owner_id = next_id(&mut args, "owner_id")?;
            print_json(&state.workbook_api.list_summaries(owner_id).await?)
        }
        "workbook" => {
            let owner_id = next_id(&mut args, "owner_id")?;
            let workbook_id = next_id(&mut args, "workbook_id")?;
            print_json(&state.workbook_api.get_detail(owner_id, workbook_id).await?)
        }
        "config" => {
            let snapshot = state
                .config_manager
                .get_config_snapshot()
                .map_err(|e| e.to_string())?;
            println!("{}", snapshot);
            Ok(())
        }
        other => Err(format!("未知命令: {}\n{}", other, USAGE).into()),
    }
}
