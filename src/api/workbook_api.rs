// ==========================================
// 配方成本核算系统 - 配方 API
// ==========================================
// 职责: 配方增删改、发布、明细维护、成本明细与列表
// 红线: 核算结果每次现算，不缓存、不落库
// 规则: 明细引用的价格条目必须属于本人的价格库
// ==========================================

use std::sync::Arc;

use futures::future::join_all;
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::api::quota::{QuotaResource, SubscriptionQuota};
use crate::config::CostingConfigReader;
use crate::domain::costing::{CostBreakdown, WorkbookDetail, WorkbookSummary};
use crate::domain::workbook::{EntityStatus, Workbook, WorkbookLine, WorkbookParams};
use crate::engine::conversion::UnitConverter;
use crate::engine::costing::CostingEngine;
use crate::engine::unit_catalog::UnitCatalog;
use crate::i18n;
use crate::repository::{PriceDatabaseRepository, RepositoryError, WorkbookRepository};

// ==========================================
// WorkbookApi - 配方 API
// ==========================================

/// 配方 API
///
/// 职责：
/// 1. 配方管理（创建、修改、删除、发布）
/// 2. 明细维护（新增、删除）
/// 3. 成本明细与列表（每次现算）
pub struct WorkbookApi {
    workbook_repo: Arc<WorkbookRepository>,
    price_repo: Arc<PriceDatabaseRepository>,
    config: Arc<dyn CostingConfigReader>,
    converter: Arc<dyn UnitConverter>,
    engine: CostingEngine,
    catalog: UnitCatalog,
    quota: Arc<dyn SubscriptionQuota>,
    locale: String,
}

impl WorkbookApi {
    pub fn new(
        workbook_repo: Arc<WorkbookRepository>,
        price_repo: Arc<PriceDatabaseRepository>,
        config: Arc<dyn CostingConfigReader>,
        converter: Arc<dyn UnitConverter>,
        engine: CostingEngine,
        quota: Arc<dyn SubscriptionQuota>,
    ) -> Self {
        Self {
            workbook_repo,
            price_repo,
            config,
            converter,
            engine,
            catalog: UnitCatalog::new(),
            quota,
            locale: i18n::DEFAULT_LOCALE.to_string(),
        }
    }

    /// 错误消息语言（核算说明语言由 CostingEngine 决定）
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    // ==========================================
    // 配方
    // ==========================================

    /// 新建配方
    ///
    /// # 参数
    /// - params: 核算参数，None 时使用配置中的默认值
    pub async fn create(
        &self,
        owner_id: i64,
        name: &str,
        params: Option<WorkbookParams>,
    ) -> ApiResult<Workbook> {
        let name = self.require_name(name)?;
        let params = match params {
            Some(params) => params,
            None => self
                .config
                .get_workbook_defaults()
                .await
                .map_err(|e| ApiError::InternalError(format!("读取配方默认参数失败: {}", e)))?,
        };
        self.check_params(&params)?;

        let current = self.workbook_repo.count_by_owner(owner_id)?;
        if !self.quota.can_create(owner_id, QuotaResource::Workbook, current) {
            warn!(owner_id, current, "配方配额不足");
            return Err(ApiError::QuotaExceeded(i18n::tr(
                &self.locale,
                "access.quota_exceeded",
                &[("resource", QuotaResource::Workbook.as_str())],
            )));
        }

        let workbook = self.workbook_repo.create(owner_id, name, &params)?;
        info!(owner_id, workbook_id = workbook.id, "新建配方");
        Ok(workbook)
    }

    /// 修改名称与核算参数
    pub fn update(
        &self,
        owner_id: i64,
        workbook_id: i64,
        name: &str,
        params: &WorkbookParams,
    ) -> ApiResult<Workbook> {
        let name = self.require_name(name)?;
        self.check_params(params)?;
        self.load_owned(owner_id, workbook_id)?;

        self.workbook_repo.update(workbook_id, name, params)?;
        self.load_owned(owner_id, workbook_id)
    }

    /// 删除配方（明细级联删除）
    pub fn delete(&self, owner_id: i64, workbook_id: i64) -> ApiResult<()> {
        self.load_owned(owner_id, workbook_id)?;
        self.workbook_repo.delete(workbook_id)?;
        info!(owner_id, workbook_id, "删除配方");
        Ok(())
    }

    /// 发布配方
    pub fn publish(&self, owner_id: i64, workbook_id: i64) -> ApiResult<Workbook> {
        let mut workbook = self.load_owned(owner_id, workbook_id)?;
        self.workbook_repo
            .update_status(workbook_id, EntityStatus::Published)?;
        workbook.status = EntityStatus::Published;
        Ok(workbook)
    }

    // ==========================================
    // 明细
    // ==========================================

    /// 新增明细（单位按目录规范拼写存储）
    pub fn add_line(
        &self,
        owner_id: i64,
        workbook_id: i64,
        line: &WorkbookLine,
    ) -> ApiResult<WorkbookLine> {
        self.load_owned(owner_id, workbook_id)?;

        if line.quantity <= Decimal::ZERO {
            return Err(ApiError::InvalidInput(i18n::tr(
                &self.locale,
                "validation.quantity_not_positive",
                &[],
            )));
        }
        if line.additional_cost < Decimal::ZERO {
            return Err(self.negative_value("additionalCost"));
        }
        let unit = self.catalog.canonical_code(&line.unit).ok_or_else(|| {
            ApiError::InvalidInput(i18n::tr(&self.locale, "validation.invalid_unit", &[]))
        })?;

        let item = self
            .price_repo
            .find_item(line.catalog_item_id)?
            .ok_or_else(|| RepositoryError::not_found("PriceItem", line.catalog_item_id))?;
        let database = self
            .price_repo
            .find_by_id(item.price_database_id)?
            .ok_or_else(|| RepositoryError::not_found("PriceDatabase", item.price_database_id))?;
        if database.owner_id != owner_id {
            return Err(self.forbidden());
        }

        let line = self.workbook_repo.add_line(
            workbook_id,
            &WorkbookLine {
                id: None,
                catalog_item_id: item.id,
                quantity: line.quantity,
                unit: unit.to_string(),
                additional_cost: line.additional_cost,
            },
        )?;
        info!(workbook_id, line_id = ?line.id, catalog_item_id = item.id, "新增配方明细");
        Ok(line)
    }

    /// 删除明细
    pub fn remove_line(&self, owner_id: i64, workbook_id: i64, line_id: i64) -> ApiResult<()> {
        self.load_owned(owner_id, workbook_id)?;
        match self.workbook_repo.find_line_workbook_id(line_id)? {
            Some(owner_workbook) if owner_workbook == workbook_id => {
                self.workbook_repo.remove_line(workbook_id, line_id)?;
                Ok(())
            }
            Some(_) => Err(self.forbidden()),
            None => Err(RepositoryError::not_found("WorkbookItem", line_id).into()),
        }
    }

    // ==========================================
    // 核算
    // ==========================================

    /// 配方成本明细（现算）
    #[instrument(skip(self))]
    pub async fn get_detail(&self, owner_id: i64, workbook_id: i64) -> ApiResult<WorkbookDetail> {
        let workbook = self.load_owned(owner_id, workbook_id)?;
        let breakdown = self.compute(&workbook).await?;
        Ok(WorkbookDetail::new(&workbook, breakdown))
    }

    /// 用户配方列表（最新在前，各配方并发现算）
    #[instrument(skip(self))]
    pub async fn list_summaries(&self, owner_id: i64) -> ApiResult<Vec<WorkbookSummary>> {
        let workbooks = self.workbook_repo.list_by_owner(owner_id)?;

        let breakdowns = join_all(workbooks.iter().map(|workbook| self.compute(workbook))).await;

        workbooks
            .iter()
            .zip(breakdowns)
            .map(|(workbook, breakdown)| Ok(WorkbookSummary::new(workbook, &breakdown?)))
            .collect()
    }

    async fn compute(&self, workbook: &Workbook) -> ApiResult<CostBreakdown> {
        let lines = self.workbook_repo.list_lines(workbook.id)?;
        let item_ids: Vec<i64> = lines.iter().map(|line| line.catalog_item_id).collect();
        let items = self.price_repo.find_items_by_ids(&item_ids)?;

        let breakdown = self
            .engine
            .compute(&workbook.params, &lines, &items, self.converter.as_ref())
            .await?;
        Ok(breakdown)
    }

    // ==========================================
    // 内部校验
    // ==========================================

    fn require_name<'a>(&self, name: &'a str) -> ApiResult<&'a str> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::InvalidInput(i18n::tr(
                &self.locale,
                "validation.name_required",
                &[],
            )));
        }
        Ok(name)
    }

    fn check_params(&self, params: &WorkbookParams) -> ApiResult<()> {
        match params.first_negative_field() {
            Some(field) => Err(self.negative_value(field)),
            None => Ok(()),
        }
    }

    fn negative_value(&self, field: &str) -> ApiError {
        ApiError::InvalidInput(i18n::tr(
            &self.locale,
            "validation.negative_value",
            &[("field", field)],
        ))
    }

    fn forbidden(&self) -> ApiError {
        ApiError::Forbidden(i18n::tr(&self.locale, "access.forbidden", &[]))
    }

    fn load_owned(&self, owner_id: i64, workbook_id: i64) -> ApiResult<Workbook> {
        let workbook = self
            .workbook_repo
            .find_by_id(workbook_id)?
            .ok_or_else(|| RepositoryError::not_found("Workbook", workbook_id))?;
        if workbook.owner_id != owner_id {
            return Err(self.forbidden());
        }
        Ok(workbook)
    }
}
