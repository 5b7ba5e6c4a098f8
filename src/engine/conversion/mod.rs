// ==========================================
// 配方成本核算系统 - 单位换算模块
// ==========================================
// 组成: 远程提供方（可选） + 本地比例表
// ==========================================

pub mod error;
pub mod fallback;
pub mod provider;
pub mod service;

pub use error::{ConversionError, ConversionResult};
pub use fallback::{convert_via_fallback, fallback_pairs, fallback_ratio};
pub use provider::{extract_converted_value, ConversionProvider, RapidApiProvider, RapidApiSettings};
pub use service::{UnitConversionService, UnitConverter, DEFAULT_REMOTE_TIMEOUT};
