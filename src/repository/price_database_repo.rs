// ==========================================
// 配方成本核算系统 - 价格库数据仓储
// ==========================================
// 职责: price_database / price_item 表的 CRUD
// 红线: Repository 不含业务逻辑（校验在导入层/API 层完成）
// ==========================================

use crate::domain::catalog::{CatalogItem, NewPriceItem, PriceDatabase};
use crate::repository::decimal_sql::{get_decimal, to_sql_text};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row, Transaction};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const DATABASE_COLUMNS: &str = r#"
    d.id, d.owner_id, d.name, d.source_url, d.upload_date,
    (SELECT COUNT(*) FROM price_item i WHERE i.price_database_id = d.id) AS item_count
"#;

const ITEM_COLUMNS: &str = "id, price_database_id, external_id, product, price, unit";

fn map_database(row: &Row<'_>) -> SqliteResult<PriceDatabase> {
    Ok(PriceDatabase {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        source_url: row.get(3)?,
        upload_date: row.get::<_, DateTime<Utc>>(4)?,
        item_count: row.get(5)?,
    })
}

fn map_item(row: &Row<'_>) -> SqliteResult<CatalogItem> {
    Ok(CatalogItem {
        id: row.get(0)?,
        price_database_id: row.get(1)?,
        external_id: row.get(2)?,
        product: row.get(3)?,
        price: get_decimal(row, 4)?,
        unit: row.get(5)?,
    })
}

fn insert_items(
    tx: &Transaction<'_>,
    price_database_id: i64,
    items: &[NewPriceItem],
) -> RepositoryResult<usize> {
    let mut stmt = tx.prepare(
        r#"
        INSERT INTO price_item (price_database_id, external_id, product, price, unit)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )?;

    let mut count = 0;
    for item in items {
        count += stmt.execute(params![
            price_database_id,
            item.external_id,
            item.product,
            to_sql_text(item.price),
            item.unit,
        ])?;
    }
    Ok(count)
}

// ==========================================
// PriceDatabaseRepository - 价格库仓储
// ==========================================
pub struct PriceDatabaseRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PriceDatabaseRepository {
    /// 创建新的 PriceDatabaseRepository 实例
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
    // 价格库
    // ==========================================

    /// 创建价格库并写入条目（单事务）
    pub fn create_with_items(
        &self,
        owner_id: i64,
        name: &str,
        source_url: Option<&str>,
        items: &[NewPriceItem],
    ) -> RepositoryResult<PriceDatabase> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO price_database (owner_id, name, source_url, upload_date)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![owner_id, name, source_url, Utc::now()],
        )?;
        let database_id = tx.last_insert_rowid();
        insert_items(&tx, database_id, items)?;

        let database = tx.query_row(
            &format!("SELECT {} FROM price_database d WHERE d.id = ?1", DATABASE_COLUMNS),
            params![database_id],
            map_database,
        )?;
        tx.commit()?;

        Ok(database)
    }

    /// 替换价格库的全部条目（引用旧条目的配方明细随之级联删除）
    pub fn replace_items(
        &self,
        price_database_id: i64,
        items: &[NewPriceItem],
    ) -> RepositoryResult<PriceDatabase> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let updated = tx.execute(
            "UPDATE price_database SET upload_date = ?1 WHERE id = ?2",
            params![Utc::now(), price_database_id],
        )?;
        if updated == 0 {
            return Err(RepositoryError::not_found("PriceDatabase", price_database_id));
        }

        tx.execute(
            "DELETE FROM price_item WHERE price_database_id = ?1",
            params![price_database_id],
        )?;
        insert_items(&tx, price_database_id, items)?;

        let database = tx.query_row(
            &format!("SELECT {} FROM price_database d WHERE d.id = ?1", DATABASE_COLUMNS),
            params![price_database_id],
            map_database,
        )?;
        tx.commit()?;

        Ok(database)
    }

    /// 按主键查询
    pub fn find_by_id(&self, price_database_id: i64) -> RepositoryResult<Option<PriceDatabase>> {
        let conn = self.get_conn()?;
        let database = conn
            .query_row(
                &format!("SELECT {} FROM price_database d WHERE d.id = ?1", DATABASE_COLUMNS),
                params![price_database_id],
                map_database,
            )
            .optional()?;
        Ok(database)
    }

    /// 查询用户的全部价格库（最新在前）
    pub fn list_by_owner(&self, owner_id: i64) -> RepositoryResult<Vec<PriceDatabase>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM price_database d WHERE d.owner_id = ?1 ORDER BY d.upload_date DESC, d.id DESC",
            DATABASE_COLUMNS
        ))?;

        let databases = stmt
            .query_map(params![owner_id], map_database)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(databases)
    }

    /// 用户价格库数量（配额检查）
    pub fn count_by_owner(&self, owner_id: i64) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM price_database WHERE owner_id = ?1",
            params![owner_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 更新名称与来源地址
    pub fn update_header(
        &self,
        price_database_id: i64,
        name: &str,
        source_url: Option<&str>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let updated = conn.execute(
            "UPDATE price_database SET name = ?1, source_url = ?2 WHERE id = ?3",
            params![name, source_url, price_database_id],
        )?;
        if updated == 0 {
            return Err(RepositoryError::not_found("PriceDatabase", price_database_id));
        }
        Ok(())
    }

    /// 删除价格库（条目级联删除）
    pub fn delete(&self, price_database_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let deleted = conn.execute(
            "DELETE FROM price_database WHERE id = ?1",
            params![price_database_id],
        )?;
        if deleted == 0 {
            return Err(RepositoryError::not_found("PriceDatabase", price_database_id));
        }
        Ok(())
    }

    // ==========================================
    // 价格条目
    // ==========================================

    /// 查询价格库的全部条目（按 id 升序）
    pub fn list_items(&self, price_database_id: i64) -> RepositoryResult<Vec<CatalogItem>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM price_item WHERE price_database_id = ?1 ORDER BY id ASC",
            ITEM_COLUMNS
        ))?;

        let items = stmt
            .query_map(params![price_database_id], map_item)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(items)
    }

    /// 按主键查询条目
    pub fn find_item(&self, item_id: i64) -> RepositoryResult<Option<CatalogItem>> {
        let conn = self.get_conn()?;
        let item = conn
            .query_row(
                &format!("SELECT {} FROM price_item WHERE id = ?1", ITEM_COLUMNS),
                params![item_id],
                map_item,
            )
            .optional()?;
        Ok(item)
    }

    /// 批量查询条目（核算用）
    pub fn find_items_by_ids(&self, item_ids: &[i64]) -> RepositoryResult<HashMap<i64, CatalogItem>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM price_item WHERE id = ?1",
            ITEM_COLUMNS
        ))?;

        let mut items = HashMap::with_capacity(item_ids.len());
        for id in item_ids {
            if items.contains_key(id) {
                continue;
            }
            if let Some(item) = stmt.query_row(params![id], map_item).optional()? {
                items.insert(*id, item);
            }
        }
        Ok(items)
    }

    /// 外部编号是否已被占用（不区分大小写，可排除指定条目）
    pub fn external_id_taken(
        &self,
        price_database_id: i64,
        external_id: &str,
        exclude_item_id: Option<i64>,
    ) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            r#"
            SELECT COUNT(*) FROM price_item
            WHERE price_database_id = ?1
              AND external_id IS NOT NULL
              AND LOWER(TRIM(external_id)) = LOWER(TRIM(?2))
              AND (?3 IS NULL OR id <> ?3)
            "#,
            params![price_database_id, external_id, exclude_item_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// 新增条目
    pub fn insert_item(
        &self,
        price_database_id: i64,
        item: &NewPriceItem,
    ) -> RepositoryResult<CatalogItem> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        insert_items(&tx, price_database_id, std::slice::from_ref(item))?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(item.clone().into_catalog_item(id, price_database_id))
    }

    /// 更新条目
    pub fn update_item(&self, item: &CatalogItem) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let updated = conn.execute(
            r#"
            UPDATE price_item
            SET external_id = ?1, product = ?2, price = ?3, unit = ?4
            WHERE id = ?5 AND price_database_id = ?6
            "#,
            params![
                item.external_id,
                item.product,
                to_sql_text(item.price),
                item.unit,
                item.id,
                item.price_database_id,
            ],
        )?;
        if updated == 0 {
            return Err(RepositoryError::not_found("PriceItem", item.id));
        }
        Ok(())
    }

    /// 删除条目
    pub fn delete_item(&self, item_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let deleted = conn.execute("DELETE FROM price_item WHERE id = ?1", params![item_id])?;
        if deleted == 0 {
            return Err(RepositoryError::not_found("PriceItem", item_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn setup() -> PriceDatabaseRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        PriceDatabaseRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn new_item(external_id: Option<&str>, product: &str, price: i64, unit: &str) -> NewPriceItem {
        NewPriceItem {
            external_id: external_id.map(str::to_string),
            product: product.to_string(),
            price: Decimal::new(price, 2),
            unit: unit.to_string(),
        }
    }

    #[test]
    fn test_create_with_items_and_count() {
        let repo = setup();
        let db = repo
            .create_with_items(
                7,
                "Proveedor A",
                None,
                &[
                    new_item(Some("A1"), "Harina", 1050, "kilogram"),
                    new_item(None, "Sal", 300, "kilogram"),
                ],
            )
            .unwrap();

        assert_eq!(db.item_count, 2);
        assert_eq!(db.owner_id, 7);

        let items = repo.list_items(db.id).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].price, Decimal::new(1050, 2));
        assert_eq!(items[1].external_id, None);
        assert_eq!(repo.count_by_owner(7).unwrap(), 1);
    }

    #[test]
    fn test_replace_items() {
        let repo = setup();
        let db = repo
            .create_with_items(1, "Lista", Some("https://example.test/a.xlsx"), &[new_item(None, "Sal", 100, "gram")])
            .unwrap();

        let refreshed = repo
            .replace_items(
                db.id,
                &[
                    new_item(None, "Sal", 120, "gram"),
                    new_item(None, "Pimienta", 900, "gram"),
                ],
            )
            .unwrap();
        assert_eq!(refreshed.item_count, 2);
        assert_eq!(refreshed.source_url.as_deref(), Some("https://example.test/a.xlsx"));

        let err = repo.replace_items(999, &[]).unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[test]
    fn test_external_id_taken_is_case_insensitive() {
        let repo = setup();
        let db = repo
            .create_with_items(1, "Lista", None, &[new_item(Some("X1"), "Sal", 100, "gram")])
            .unwrap();
        let item_id = repo.list_items(db.id).unwrap()[0].id;

        assert!(repo.external_id_taken(db.id, "x1", None).unwrap());
        assert!(!repo.external_id_taken(db.id, "x1", Some(item_id)).unwrap());
        assert!(!repo.external_id_taken(db.id, "x2", None).unwrap());
    }

    #[test]
    fn test_item_crud() {
        let repo = setup();
        let db = repo.create_with_items(1, "Manual", None, &[]).unwrap();
        assert_eq!(db.item_count, 0);

        let mut item = repo
            .insert_item(db.id, &new_item(None, "Leche", 250, "liter"))
            .unwrap();
        item.price = Decimal::new(275, 2);
        repo.update_item(&item).unwrap();

        let stored = repo.find_item(item.id).unwrap().unwrap();
        assert_eq!(stored.price, Decimal::new(275, 2));

        let found = repo.find_items_by_ids(&[item.id, item.id, 404]).unwrap();
        assert_eq!(found.len(), 1);

        repo.delete_item(item.id).unwrap();
        assert!(repo.find_item(item.id).unwrap().is_none());

        repo.delete(db.id).unwrap();
        assert!(repo.find_by_id(db.id).unwrap().is_none());
    }
}
