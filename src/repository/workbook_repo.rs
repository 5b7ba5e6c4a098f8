// ==========================================
// 配方成本核算系统 - 配方数据仓储
// ==========================================
// 职责: workbook / workbook_item 表的 CRUD
// 红线: Repository 不含业务逻辑，不存储核算结果
// ==========================================

use crate::domain::workbook::{EntityStatus, Workbook, WorkbookLine, WorkbookParams};
use crate::repository::decimal_sql::{get_decimal, get_optional_decimal, to_sql_text};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const WORKBOOK_COLUMNS: &str = r#"
    id, owner_id, name,
    production_units, tax_percentage, profit_margin_percentage, target_sale_price,
    operational_cost_percentage, operational_cost_fixed,
    status, created_at
"#;

const LINE_COLUMNS: &str = "id, price_item_id, quantity, unit, additional_cost";

fn map_workbook(row: &Row<'_>) -> SqliteResult<Workbook> {
    Ok(Workbook {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        params: WorkbookParams {
            production_units: get_decimal(row, 3)?,
            tax_percentage: get_decimal(row, 4)?,
            profit_margin_percentage: get_decimal(row, 5)?,
            target_sale_price: get_optional_decimal(row, 6)?,
            operational_cost_percentage: get_decimal(row, 7)?,
            operational_cost_fixed: get_decimal(row, 8)?,
        },
        status: EntityStatus::from_db_str(&row.get::<_, String>(9)?),
        created_at: row.get::<_, DateTime<Utc>>(10)?,
    })
}

fn map_line(row: &Row<'_>) -> SqliteResult<WorkbookLine> {
    Ok(WorkbookLine {
        id: Some(row.get(0)?),
        catalog_item_id: row.get(1)?,
        quantity: get_decimal(row, 2)?,
        unit: row.get(3)?,
        additional_cost: get_decimal(row, 4)?,
    })
}

// ==========================================
// WorkbookRepository - 配方仓储
// ==========================================
pub struct WorkbookRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WorkbookRepository {
    /// 创建新的 WorkbookRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_and_migrate(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 配方
    // ==========================================

    /// 创建配方（状态为 Draft）
    pub fn create(
        &self,
        owner_id: i64,
        name: &str,
        params: &WorkbookParams,
    ) -> RepositoryResult<Workbook> {
        let created_at = Utc::now();
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO workbook (
                owner_id, name,
                production_units, tax_percentage, profit_margin_percentage, target_sale_price,
                operational_cost_percentage, operational_cost_fixed,
                status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                owner_id,
                name,
                to_sql_text(params.production_units),
                to_sql_text(params.tax_percentage),
                to_sql_text(params.profit_margin_percentage),
                params.target_sale_price.map(to_sql_text),
                to_sql_text(params.operational_cost_percentage),
                to_sql_text(params.operational_cost_fixed),
                EntityStatus::Draft.to_db_str(),
                created_at,
            ],
        )?;

        Ok(Workbook {
            id: conn.last_insert_rowid(),
            owner_id,
            name: name.to_string(),
            params: params.clone(),
            status: EntityStatus::Draft,
            created_at,
        })
    }

    /// 按主键查询
    pub fn find_by_id(&self, workbook_id: i64) -> RepositoryResult<Option<Workbook>> {
        let conn = self.get_conn()?;
        let workbook = conn
            .query_row(
                &format!("SELECT {} FROM workbook WHERE id = ?1", WORKBOOK_COLUMNS),
                params![workbook_id],
                map_workbook,
            )
            .optional()?;
        Ok(workbook)
    }

    /// 查询用户的全部配方（最新在前）
    pub fn list_by_owner(&self, owner_id: i64) -> RepositoryResult<Vec<Workbook>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM workbook WHERE owner_id = ?1 ORDER BY created_at DESC, id DESC",
            WORKBOOK_COLUMNS
        ))?;

        let workbooks = stmt
            .query_map(params![owner_id], map_workbook)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(workbooks)
    }

    /// 用户配方数量（配额检查）
    pub fn count_by_owner(&self, owner_id: i64) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM workbook WHERE owner_id = ?1",
            params![owner_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 更新名称与核算参数
    pub fn update(&self, workbook_id: i64, name: &str, params: &WorkbookParams) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let updated = conn.execute(
            r#"
            UPDATE workbook SET
                name = ?1,
                production_units = ?2,
                tax_percentage = ?3,
                profit_margin_percentage = ?4,
                target_sale_price = ?5,
                operational_cost_percentage = ?6,
                operational_cost_fixed = ?7
            WHERE id = ?8
            "#,
            params![
                name,
                to_sql_text(params.production_units),
                to_sql_text(params.tax_percentage),
                to_sql_text(params.profit_margin_percentage),
                params.target_sale_price.map(to_sql_text),
                to_sql_text(params.operational_cost_percentage),
                to_sql_text(params.operational_cost_fixed),
                workbook_id,
            ],
        )?;
        if updated == 0 {
            return Err(RepositoryError::not_found("Workbook", workbook_id));
        }
        Ok(())
    }

    /// 更新状态
    pub fn update_status(&self, workbook_id: i64, status: EntityStatus) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let updated = conn.execute(
            "UPDATE workbook SET status = ?1 WHERE id = ?2",
            params![status.to_db_str(), workbook_id],
        )?;
        if updated == 0 {
            return Err(RepositoryError::not_found("Workbook", workbook_id));
        }
        Ok(())
    }

    /// 删除配方（明细级联删除）
    pub fn delete(&self, workbook_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let deleted = conn.execute("DELETE FROM workbook WHERE id = ?1", params![workbook_id])?;
        if deleted == 0 {
            return Err(RepositoryError::not_found("Workbook", workbook_id));
        }
        Ok(())
    }

    // ==========================================
    // 配方明细
    // ==========================================

    /// 查询配方明细（按录入顺序）
    pub fn list_lines(&self, workbook_id: i64) -> RepositoryResult<Vec<WorkbookLine>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM workbook_item WHERE workbook_id = ?1 ORDER BY id ASC",
            LINE_COLUMNS
        ))?;

        let lines = stmt
            .query_map(params![workbook_id], map_line)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(lines)
    }

    /// 新增明细
    pub fn add_line(&self, workbook_id: i64, line: &WorkbookLine) -> RepositoryResult<WorkbookLine> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO workbook_item (workbook_id, price_item_id, quantity, unit, additional_cost)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                workbook_id,
                line.catalog_item_id,
                to_sql_text(line.quantity),
                line.unit,
                to_sql_text(line.additional_cost),
            ],
        )?;

        Ok(WorkbookLine {
            id: Some(conn.last_insert_rowid()),
            ..line.clone()
        })
    }

    /// 查询明细所属配方
    pub fn find_line_workbook_id(&self, line_id: i64) -> RepositoryResult<Option<i64>> {
        let conn = self.get_conn()?;
        let workbook_id = conn
            .query_row(
                "SELECT workbook_id FROM workbook_item WHERE id = ?1",
                params![line_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(workbook_id)
    }

    /// 删除明细
    pub fn remove_line(&self, workbook_id: i64, line_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let deleted = conn.execute(
            "DELETE FROM workbook_item WHERE id = ?1 AND workbook_id = ?2",
            params![line_id, workbook_id],
        )?;
        if deleted == 0 {
            return Err(RepositoryError::not_found("WorkbookItem", line_id));
        }
        Ok(())
    }
}
