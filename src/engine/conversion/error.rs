// ==========================================
// 配方成本核算系统 - 单位换算错误类型
// ==========================================
// 红线: 仅在换算边界内部流转，convert() 对外只返回 Option
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 远程换算失败原因
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("换算服务配置缺失或不完整: {0}")]
    NotConfigured(String),

    #[error("HTTP 客户端初始化失败: {0}")]
    ClientBuild(String),

    #[error("HTTP 请求失败: {0}")]
    Http(#[from] reqwest::Error),

    #[error("换算服务返回非成功状态码: {status}")]
    Status { status: u16 },

    #[error("换算服务响应解析失败: {0}")]
    Parse(String),

    #[error("换算服务响应中无可用数值字段: {body}")]
    MissingValue { body: String },

    #[error("换算服务超时 ({timeout_ms}ms)")]
    Timeout { timeout_ms: u64 },
}

impl From<serde_json::Error> for ConversionError {
    fn from(err: serde_json::Error) -> Self {
        ConversionError::Parse(err.to_string())
    }
}

/// Result 类型别名
pub type ConversionResult<T> = Result<T, ConversionError>;
