// ==========================================
// 配方成本核算系统 - 价格库 API
// ==========================================
// 职责: 价格库增删改查、文件/远程导入、条目维护
// 规则: 所有操作先校验归属（非本人资源 → Forbidden）
// 规则: 手工维护条目与导入使用同一套校验
// ==========================================

use std::path::Path;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::api::quota::{QuotaResource, SubscriptionQuota};
use crate::domain::catalog::{CatalogItem, NewPriceItem, PriceDatabase};
use crate::domain::import::{ImportValidationResult, RowError, COLUMN_EXTERNAL_ID};
use crate::i18n;
use crate::importer::price_importer_trait::{PriceImportOutcome, PriceImporter};
use crate::importer::price_validator::ImportValidator;
use crate::repository::{PriceDatabaseRepository, RepositoryError};

// ==========================================
// PriceDatabaseApi - 价格库 API
// ==========================================

/// 价格库 API
///
/// 职责：
/// 1. 价格库管理（创建、查询、改名、删除）
/// 2. 导入（文件、远程地址、刷新）
/// 3. 条目维护（新增、修改、删除）
pub struct PriceDatabaseApi {
    repo: Arc<PriceDatabaseRepository>,
    importer: Arc<dyn PriceImporter>,
    validator: ImportValidator,
    quota: Arc<dyn SubscriptionQuota>,
}

impl PriceDatabaseApi {
    pub fn new(
        repo: Arc<PriceDatabaseRepository>,
        importer: Arc<dyn PriceImporter>,
        validator: ImportValidator,
        quota: Arc<dyn SubscriptionQuota>,
    ) -> Self {
        Self {
            repo,
            importer,
            validator,
            quota,
        }
    }

    fn locale(&self) -> &str {
        self.validator.locale()
    }

    // ==========================================
    // 价格库
    // ==========================================

    /// 新建空价格库
    pub fn create(
        &self,
        owner_id: i64,
        name: &str,
        source_url: Option<&str>,
    ) -> ApiResult<PriceDatabase> {
        let name = self.require_name(name)?;
        self.check_quota(owner_id)?;

        let source_url = source_url.map(str::trim).filter(|u| !u.is_empty());
        let database = self.repo.create_with_items(owner_id, name, source_url, &[])?;
        info!(owner_id, price_database_id = database.id, "新建价格库");
        Ok(database)
    }

    /// 查询价格库
    pub fn get(&self, owner_id: i64, price_database_id: i64) -> ApiResult<PriceDatabase> {
        self.load_owned(owner_id, price_database_id)
    }

    /// 查询用户的全部价格库
    pub fn list(&self, owner_id: i64) -> ApiResult<Vec<PriceDatabase>> {
        Ok(self.repo.list_by_owner(owner_id)?)
    }

    /// 修改名称与远程来源
    pub fn update(
        &self,
        owner_id: i64,
        price_database_id: i64,
        name: &str,
        source_url: Option<&str>,
    ) -> ApiResult<PriceDatabase> {
        let name = self.require_name(name)?;
        self.load_owned(owner_id, price_database_id)?;

        let source_url = source_url.map(str::trim).filter(|u| !u.is_empty());
        self.repo.update_header(price_database_id, name, source_url)?;
        self.load_owned(owner_id, price_database_id)
    }

    /// 删除价格库（条目级联删除）
    pub fn delete(&self, owner_id: i64, price_database_id: i64) -> ApiResult<()> {
        self.load_owned(owner_id, price_database_id)?;
        self.repo.delete(price_database_id)?;
        info!(owner_id, price_database_id, "删除价格库");
        Ok(())
    }

    // ==========================================
    // 导入
    // ==========================================

    /// 试导入（只校验不落库）
    pub async fn validate_file(&self, file_path: &Path) -> ApiResult<ImportValidationResult> {
        Ok(self.importer.validate_file(file_path).await?)
    }

    /// 上传文件新建价格库（校验未通过时返回报告，不落库）
    #[instrument(skip(self, file_path))]
    pub async fn upload(
        &self,
        owner_id: i64,
        name: &str,
        file_path: &Path,
    ) -> ApiResult<PriceImportOutcome> {
        let name = self.require_name(name)?;
        self.check_quota(owner_id)?;
        Ok(self.importer.import_file(owner_id, name, file_path).await?)
    }

    /// 从远程地址新建价格库
    #[instrument(skip(self))]
    pub async fn import_from_url(
        &self,
        owner_id: i64,
        name: &str,
        url: &str,
    ) -> ApiResult<PriceImportOutcome> {
        let name = self.require_name(name)?;
        let url = url.trim();
        if url.is_empty() {
            return Err(ApiError::InvalidInput(i18n::tr(
                self.locale(),
                "validation.url_required",
                &[],
            )));
        }
        self.check_quota(owner_id)?;
        Ok(self.importer.import_from_url(owner_id, name, url).await?)
    }

    /// 按远程来源重新导入（校验未通过时保留原条目）
    #[instrument(skip(self))]
    pub async fn refresh(&self, owner_id: i64, price_database_id: i64) -> ApiResult<PriceImportOutcome> {
        self.load_owned(owner_id, price_database_id)?;
        Ok(self.importer.refresh(price_database_id).await?)
    }

    // ==========================================
    // 条目
    // ==========================================

    /// 查询价格库条目
    pub fn list_items(&self, owner_id: i64, price_database_id: i64) -> ApiResult<Vec<CatalogItem>> {
        self.load_owned(owner_id, price_database_id)?;
        Ok(self.repo.list_items(price_database_id)?)
    }

    /// 新增条目
    pub fn add_item(
        &self,
        owner_id: i64,
        price_database_id: i64,
        item: &NewPriceItem,
    ) -> ApiResult<CatalogItem> {
        self.load_owned(owner_id, price_database_id)?;
        let item = self.validate_item(price_database_id, item, None)?;

        let created = self.repo.insert_item(price_database_id, &item)?;
        info!(price_database_id, item_id = created.id, "新增价格条目");
        Ok(created)
    }

    /// 修改条目
    pub fn update_item(
        &self,
        owner_id: i64,
        item_id: i64,
        item: &NewPriceItem,
    ) -> ApiResult<CatalogItem> {
        let existing = self.load_owned_item(owner_id, item_id)?;
        let item = self.validate_item(existing.price_database_id, item, Some(item_id))?;

        let updated = item.into_catalog_item(item_id, existing.price_database_id);
        self.repo.update_item(&updated)?;
        Ok(updated)
    }

    /// 删除条目
    pub fn delete_item(&self, owner_id: i64, item_id: i64) -> ApiResult<()> {
        self.load_owned_item(owner_id, item_id)?;
        self.repo.delete_item(item_id)?;
        Ok(())
    }

    // ==========================================
    // 内部校验
    // ==========================================

    fn validate_item(
        &self,
        price_database_id: i64,
        item: &NewPriceItem,
        exclude_item_id: Option<i64>,
    ) -> ApiResult<NewPriceItem> {
        let item = self
            .validator
            .validate_item(item)
            .map_err(ApiError::ValidationError)?;

        if let Some(external_id) = item.external_id.as_deref() {
            if self
                .repo
                .external_id_taken(price_database_id, external_id, exclude_item_id)?
            {
                return Err(ApiError::ValidationError(vec![RowError {
                    row: 0,
                    column: COLUMN_EXTERNAL_ID.to_string(),
                    raw_value: external_id.to_string(),
                    message: i18n::tr(
                        self.locale(),
                        "validation.external_id_taken",
                        &[("id", external_id)],
                    ),
                }]));
            }
        }
        Ok(item)
    }

    fn require_name<'a>(&self, name: &'a str) -> ApiResult<&'a str> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::InvalidInput(i18n::tr(
                self.locale(),
                "validation.name_required",
                &[],
            )));
        }
        Ok(name)
    }

    fn check_quota(&self, owner_id: i64) -> ApiResult<()> {
        let current = self.repo.count_by_owner(owner_id)?;
        if !self
            .quota
            .can_create(owner_id, QuotaResource::PriceDatabase, current)
        {
            warn!(owner_id, current, "价格库配额不足");
            return Err(ApiError::QuotaExceeded(i18n::tr(
                self.locale(),
                "access.quota_exceeded",
                &[("resource", QuotaResource::PriceDatabase.as_str())],
            )));
        }
        Ok(())
    }

    fn load_owned(&self, owner_id: i64, price_database_id: i64) -> ApiResult<PriceDatabase> {
        let database = self
            .repo
            .find_by_id(price_database_id)?
            .ok_or_else(|| RepositoryError::not_found("PriceDatabase", price_database_id))?;
        if database.owner_id != owner_id {
            return Err(ApiError::Forbidden(i18n::tr(self.locale(), "access.forbidden", &[])));
        }
        Ok(database)
    }

    fn load_owned_item(&self, owner_id: i64, item_id: i64) -> ApiResult<CatalogItem> {
        let item = self
            .repo
            .find_item(item_id)?
            .ok_or_else(|| RepositoryError::not_found("PriceItem", item_id))?;
        self.load_owned(owner_id, item.price_database_id)?;
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::quota::{FixedQuota, UnlimitedQuota};
    use crate::importer::price_importer::PriceImporterImpl;
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use std::sync::Mutex;

    fn api_with_quota(quota: Arc<dyn SubscriptionQuota>) -> PriceDatabaseApi {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        let repo = Arc::new(PriceDatabaseRepository::from_connection(Arc::new(Mutex::new(conn))));
        let validator = ImportValidator::default().with_locale("en");
        let importer = Arc::new(PriceImporterImpl::new(repo.clone(), validator.clone()).unwrap());
        PriceDatabaseApi::new(repo, importer, validator, quota)
    }

    fn api() -> PriceDatabaseApi {
        api_with_quota(Arc::new(UnlimitedQuota))
    }

    fn item(external_id: Option<&str>, product: &str, price: i64, unit: &str) -> NewPriceItem {
        NewPriceItem {
            external_id: external_id.map(str::to_string),
            product: product.to_string(),
            price: Decimal::new(price, 0),
            unit: unit.to_string(),
        }
    }

    #[test]
    fn test_add_item_normalizes_and_counts() {
        let api = api();
        let db = api.create(1, "Mercado", None).unwrap();

        let created = api
            .add_item(1, db.id, &item(Some(" A1 "), "  Harina ", 10, "KILOGRAM"))
            .unwrap();

        assert_eq!(created.product, "Harina");
        assert_eq!(created.unit, "kilogram");
        assert_eq!(created.external_id.as_deref(), Some("A1"));
        assert_eq!(api.get(1, db.id).unwrap().item_count, 1);
    }

    #[test]
    fn test_add_item_rejects_invalid_fields() {
        let api = api();
        let db = api.create(1, "Mercado", None).unwrap();

        let err = api.add_item(1, db.id, &item(None, " ", 0, "cup")).unwrap_err();
        match err {
            ApiError::ValidationError(errors) => {
                let columns: Vec<&str> = errors.iter().map(|e| e.column.as_str()).collect();
                assert_eq!(columns, vec!["Producto", "Precio", "Unidad"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_external_id_unique_within_database() {
        let api = api();
        let db = api.create(1, "Mercado", None).unwrap();
        let first = api.add_item(1, db.id, &item(Some("X1"), "Harina", 10, "kilogram")).unwrap();

        let err = api
            .add_item(1, db.id, &item(Some("x1"), "Azucar", 5, "kilogram"))
            .unwrap_err();
        match err {
            ApiError::ValidationError(errors) => {
                assert_eq!(errors[0].message, "An item with ExternalId 'x1' already exists in this database");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        // 修改自身时不与自己冲突
        let updated = api
            .update_item(1, first.id, &item(Some("X1"), "Harina 000", 12, "kilogram"))
            .unwrap();
        assert_eq!(updated.product, "Harina 000");

        // 其他价格库不受影响
        let other = api.create(1, "Otro", None).unwrap();
        assert!(api.add_item(1, other.id, &item(Some("X1"), "Harina", 9, "kilogram")).is_ok());
    }

    #[test]
    fn test_foreign_owner_is_forbidden() {
        let api = api();
        let db = api.create(1, "Mercado", None).unwrap();
        let created = api.add_item(1, db.id, &item(None, "Harina", 10, "kilogram")).unwrap();

        assert!(matches!(api.get(2, db.id), Err(ApiError::Forbidden(_))));
        assert!(matches!(api.delete_item(2, created.id), Err(ApiError::Forbidden(_))));
        assert!(matches!(api.get(1, 999), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn test_create_respects_quota_and_name() {
        let api = api_with_quota(Arc::new(FixedQuota {
            max_price_databases: 1,
            max_workbooks: 1,
        }));

        assert!(matches!(api.create(1, "  ", None), Err(ApiError::InvalidInput(_))));
        api.create(1, "Mercado", None).unwrap();
        let err = api.create(1, "Segundo", None).unwrap_err();
        assert!(matches!(err, ApiError::QuotaExceeded(msg) if msg == "price_database limit reached for your plan"));
    }

    #[tokio::test]
    async fn test_refresh_without_source_is_invalid_input() {
        let api = api();
        let db = api.create(1, "Mercado", Some("  ")).unwrap();
        assert!(db.source_url.is_none());

        let err = api.refresh(1, db.id).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_import_from_blank_url_is_localized_invalid_input() {
        let api = api();

        let err = api.import_from_url(1, "Mercado", "   ").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(msg) if msg == "The source URL is required"));
        assert!(api.list(1).unwrap().is_empty());
    }
}
