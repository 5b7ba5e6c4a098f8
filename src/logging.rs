// ==========================================
// 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 支持环境变量配置日志级别与输出格式
// ==========================================

use crate::config::env_keys;
use tracing_subscriber::{fmt, EnvFilter};

/// 默认过滤器（RUST_LOG 未设置时）
const DEFAULT_FILTER: &str = "info";

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器（默认: info）
///   例如: RUST_LOG=debug 或 RUST_LOG=costing_engine::engine=trace
///
/// # 示例
/// ```no_run
/// use costing_engine::logging;
/// logging::init();
/// ```
pub fn init() {
    init_with_default(DEFAULT_FILTER);
}

/// 初始化日志系统，指定 RUST_LOG 未设置时的过滤器
pub fn init_with_default(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();
}

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    /// 供日志采集
    Json,
}

impl LogFormat {
    /// 解析格式名，未知值按文本处理
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }

    /// 读取 COSTING_LOG_FORMAT
    pub fn from_env() -> Self {
        Self::parse(std::env::var(env_keys::LOG_FORMAT).ok().as_deref())
    }
}

/// 按格式初始化日志系统
pub fn init_with_format(format: LogFormat, default_filter: &str) {
    match format {
        LogFormat::Text => init_with_default(default_filter),
        LogFormat::Json => init_json(default_filter),
    }
}

/// JSON 格式日志
pub fn init_json(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt().json().with_env_filter(filter).with_current_span(true).init();
}

/// 初始化测试环境的日志系统
///
/// 使用更详细的日志级别，便于调试；重复调用无副作用
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
