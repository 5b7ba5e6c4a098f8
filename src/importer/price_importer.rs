// ==========================================
// 配方成本核算系统 - 价格导入器实现
// ==========================================
// 职责: 整合导入流程，从文件/远程地址到价格库
// 流程: 读取 → 校验 → （全部通过时）落库
// 红线: 校验未通过不写入任何数据
// ==========================================

use crate::domain::import::{ImportValidationResult, RawRow};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{CsvParser, ExcelParser, UniversalFileParser};
use crate::importer::price_importer_trait::{FileParser, PriceImportOutcome, PriceImporter};
use crate::importer::price_validator::ImportValidator;
use crate::repository::{PriceDatabaseRepository, RepositoryError};
use async_trait::async_trait;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// 远程下载超时
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

// ==========================================
// PriceImporterImpl - 价格导入器实现
// ==========================================
pub struct PriceImporterImpl {
    repo: Arc<PriceDatabaseRepository>,
    file_parser: Box<dyn FileParser>,
    validator: ImportValidator,
    http: reqwest::Client,
}

impl PriceImporterImpl {
    /// 创建新的 PriceImporter 实例
    ///
    /// # 参数
    /// - repo: 价格库仓储
    /// - validator: 行校验器（决定错误消息语言）
    pub fn new(repo: Arc<PriceDatabaseRepository>, validator: ImportValidator) -> ImportResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .map_err(|e| ImportError::InternalError(format!("HTTP 客户端初始化失败: {}", e)))?;

        Ok(Self {
            repo,
            file_parser: Box::new(UniversalFileParser),
            validator,
            http,
        })
    }

    /// 替换文件解析器
    pub fn with_file_parser(mut self, file_parser: Box<dyn FileParser>) -> Self {
        self.file_parser = file_parser;
        self
    }

    pub fn validator(&self) -> &ImportValidator {
        &self.validator
    }

    /// 下载并解析远程文件（.csv 按 CSV 解析，其余按 XLSX）
    async fn download_rows(&self, url: &str) -> ImportResult<Vec<RawRow>> {
        let download_error = |e: reqwest::Error| ImportError::DownloadError {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(download_error)?
            .error_for_status()
            .map_err(download_error)?;
        let bytes = response.bytes().await.map_err(download_error)?;

        info!(url = %url, bytes = bytes.len(), "远程文件下载完成");

        let is_csv = url
            .split(['?', '#'])
            .next()
            .map_or(false, |path| path.to_lowercase().ends_with(".csv"));
        if is_csv {
            CsvParser.parse_reader(Cursor::new(bytes.as_ref()))
        } else {
            ExcelParser.parse_bytes(&bytes)
        }
    }

    fn validate_rows(&self, rows: &[RawRow]) -> ImportValidationResult {
        let result = self.validator.validate(rows);
        info!(
            total_rows = result.total_rows,
            valid_items = result.valid_items.len(),
            errors = result.error_count(),
            is_valid = result.is_valid,
            "行校验完成"
        );
        result
    }

    /// 校验通过则新建价格库
    fn persist_new(
        &self,
        batch_id: String,
        owner_id: i64,
        name: &str,
        source_url: Option<&str>,
        validation: ImportValidationResult,
    ) -> ImportResult<PriceImportOutcome> {
        if !validation.is_valid {
            warn!(batch_id = %batch_id, errors = validation.error_count(), "校验未通过，不落库");
            return Ok(PriceImportOutcome {
                batch_id,
                validation,
                database: None,
            });
        }

        let database = self
            .repo
            .create_with_items(owner_id, name, source_url, &validation.valid_items)
            .map_err(|e| {
                error!(batch_id = %batch_id, error = %e, "价格库落库失败");
                e
            })?;

        info!(
            batch_id = %batch_id,
            price_database_id = database.id,
            item_count = database.item_count,
            "价格库导入完成"
        );

        Ok(PriceImportOutcome {
            batch_id,
            validation,
            database: Some(database),
        })
    }
}

#[async_trait]
impl PriceImporter for PriceImporterImpl {
    #[instrument(skip(self, file_path), fields(file = %file_path.display()))]
    async fn validate_file(&self, file_path: &Path) -> ImportResult<ImportValidationResult> {
        let rows = self.file_parser.parse_rows(file_path)?;
        Ok(self.validate_rows(&rows))
    }

    #[instrument(skip(self, file_path), fields(batch_id))]
    async fn import_file(
        &self,
        owner_id: i64,
        name: &str,
        file_path: &Path,
    ) -> ImportResult<PriceImportOutcome> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());
        info!(batch_id = %batch_id, file_path = %file_path.display(), "开始导入价格库");

        let rows = self.file_parser.parse_rows(file_path).map_err(|e| {
            error!(error = %e, "文件解析失败");
            e
        })?;
        info!(total_rows = rows.len(), "文件解析完成");

        let validation = self.validate_rows(&rows);
        let outcome = self.persist_new(batch_id, owner_id, name, None, validation)?;

        info!(elapsed_ms = start_time.elapsed().as_millis() as u64, "导入流程结束");
        Ok(outcome)
    }

    #[instrument(skip(self), fields(batch_id))]
    async fn import_from_url(
        &self,
        owner_id: i64,
        name: &str,
        url: &str,
    ) -> ImportResult<PriceImportOutcome> {
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());
        info!(batch_id = %batch_id, url = %url, "开始从远程地址导入价格库");

        let rows = self.download_rows(url).await?;
        let validation = self.validate_rows(&rows);
        self.persist_new(batch_id, owner_id, name, Some(url), validation)
    }

    #[instrument(skip(self), fields(batch_id))]
    async fn refresh(&self, price_database_id: i64) -> ImportResult<PriceImportOutcome> {
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());

        let database = self
            .repo
            .find_by_id(price_database_id)?
            .ok_or_else(|| RepositoryError::not_found("PriceDatabase", price_database_id))?;
        let url = database
            .source_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(ImportError::MissingSourceUrl(price_database_id))?;

        info!(batch_id = %batch_id, price_database_id, url = %url, "开始刷新价格库");

        let rows = self.download_rows(url).await?;
        let validation = self.validate_rows(&rows);
        if !validation.is_valid {
            warn!(batch_id = %batch_id, errors = validation.error_count(), "刷新内容校验未通过，保留原条目");
            return Ok(PriceImportOutcome {
                batch_id,
                validation,
                database: None,
            });
        }

        let database = self
            .repo
            .replace_items(price_database_id, &validation.valid_items)?;
        info!(
            batch_id = %batch_id,
            price_database_id,
            item_count = database.item_count,
            "价格库刷新完成"
        );

        Ok(PriceImportOutcome {
            batch_id,
            validation,
            database: Some(database),
        })
    }
}
