// ==========================================
// 集成测试共享工具
// ==========================================

#![allow(dead_code)]

pub mod mock_provider;
pub mod test_data_builder;
pub mod http_stub;
