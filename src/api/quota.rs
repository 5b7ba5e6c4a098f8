// ==========================================
// 配方成本核算系统 - 订阅配额接口
// ==========================================
// 职责: 新建价格库/配方前的配额检查接缝
// 说明: 计数规则由订阅服务实现，本 crate 仅提供不限量默认实现
// ==========================================

/// 受配额限制的资源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaResource {
    PriceDatabase,
    Workbook,
}

impl QuotaResource {
    pub fn as_str(self) -> &'static str {
        match self {
            QuotaResource::PriceDatabase => "price_database",
            QuotaResource::Workbook => "workbook",
        }
    }
}

/// 订阅配额检查
pub trait SubscriptionQuota: Send + Sync {
    /// 用户在已拥有 current_count 个资源时能否再新建一个
    fn can_create(&self, owner_id: i64, resource: QuotaResource, current_count: i64) -> bool;
}

/// 不限量
#[derive(Debug, Clone, Copy, Default)]
pub struct UnlimitedQuota;

impl SubscriptionQuota for UnlimitedQuota {
    fn can_create(&self, _owner_id: i64, _resource: QuotaResource, _current_count: i64) -> bool {
        true
    }
}

/// 固定上限（按资源类型）
#[derive(Debug, Clone, Copy)]
pub struct FixedQuota {
    pub max_price_databases: i64,
    pub max_workbooks: i64,
}

impl SubscriptionQuota for FixedQuota {
    fn can_create(&self, _owner_id: i64, resource: QuotaResource, current_count: i64) -> bool {
        let limit = match resource {
            QuotaResource::PriceDatabase => self.max_price_databases,
            QuotaResource::Workbook => self.max_workbooks,
        };
        current_count < limit
    }
}
