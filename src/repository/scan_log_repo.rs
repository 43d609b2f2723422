// ==========================================
// 播种墙扫码分拣系统 - 扫码日志仓储
// ==========================================
// 红线: 日志只追加不修改；写入失败不反噬业务流程
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::scan_log::ScanLog;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// ScanLogRepository - 扫码日志仓储
// ==========================================
pub struct ScanLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ScanLogRepository {
    /// 创建新的 ScanLogRepository 实例
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

    /// 追加一条扫码日志
    pub fn append(&self, log: &ScanLog) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO scan_log (log_id, order_id, sku, cubby_id, outcome, detail, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                log.log_id,
                log.order_id,
                log.sku,
                log.cubby_id,
                log.outcome,
                log.detail,
                log.created_at,
            ],
        )?;
        Ok(())
    }

    /// 按订单查询日志（新在前）
    pub fn list_by_order(&self, order_id: &str, limit: i64) -> RepositoryResult<Vec<ScanLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT log_id, order_id, sku, cubby_id, outcome, detail, created_at
             FROM scan_log WHERE order_id = ?1
             ORDER BY created_at DESC LIMIT ?2",
        )?;
        let logs = stmt
            .query_map(params![order_id, limit], |row| {
                Ok(ScanLog {
                    log_id: row.get("log_id")?,
                    order_id: row.get("order_id")?,
                    sku: row.get("sku")?,
                    cubby_id: row.get("cubby_id")?,
                    outcome: row.get("outcome")?,
                    detail: row.get("detail")?,
                    created_at: row.get::<_, DateTime<Utc>>("created_at")?,
                })
            })?
            .collect::<Result<Vec<ScanLog>, _>>()?;
        Ok(logs)
    }

    /// 日志总数（测试用）
    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let n = conn.query_row("SELECT COUNT(*) FROM scan_log", [], |row| row.get(0))?;
        Ok(n)
    }
}
