// ==========================================
// 播种墙扫码分拣系统 - 商品仓储
// ==========================================
// 职责: 商品目录查询（只读参照数据）
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::product::Product;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// ProductRepository - 商品仓储
// ==========================================
pub struct ProductRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProductRepository {
    /// 创建新的 ProductRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按条码查询商品
    pub fn find_by_sku(&self, sku: &str) -> RepositoryResult<Option<Product>> {
        let conn = self.get_conn()?;
        let product = conn
            .query_row(
                "SELECT sku, name, created_at, updated_at FROM product WHERE sku = ?1",
                params![sku],
                |row| {
                    Ok(Product {
                        sku: row.get("sku")?,
                        name: row.get("name")?,
                        created_at: row.get::<_, Option<DateTime<Utc>>>("created_at")?,
                        updated_at: row.get::<_, Option<DateTime<Utc>>>("updated_at")?,
                    })
                },
            )
            .optional()?;
        Ok(product)
    }

    /// 新增商品（种子脚本/测试用）
    pub fn insert(&self, sku: &str, name: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO product (sku, name, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)",
            params![sku, name, Utc::now()],
        )?;
        Ok(())
    }
}
