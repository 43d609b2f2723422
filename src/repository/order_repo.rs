// ==========================================
// 播种墙扫码分拣系统 - 订单仓储
// ==========================================
// 职责: orders / order_item 两表的数据访问
// 红线: 剩余件数只做相对递减（remaining_items - 1），
// 不允许用流程早先读到的值回写，并发扫码会丢减
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::order::{Order, OrderItem};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// OrderRepository - 订单仓储
// ==========================================
pub struct OrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OrderRepository {
    /// 创建新的 OrderRepository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
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

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_order_row(&self, row: &Row<'_>) -> rusqlite::Result<Order> {
        Ok(Order {
            order_id: row.get("order_id")?,
            cubby_id: row.get("cubby_id")?,
            remaining_items: row.get("remaining_items")?,
            created_at: row.get::<_, Option<DateTime<Utc>>>("created_at")?,
            updated_at: row.get::<_, Option<DateTime<Utc>>>("updated_at")?,
        })
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 按订单号查询
    pub fn find_by_id(&self, order_id: &str) -> RepositoryResult<Option<Order>> {
        let conn = self.get_conn()?;
        let order = conn
            .query_row(
                "SELECT order_id, cubby_id, remaining_items, created_at, updated_at
                 FROM orders WHERE order_id = ?1",
                params![order_id],
                |row| self.map_order_row(row),
            )
            .optional()?;
        Ok(order)
    }

    /// 按格口号反查占用订单
    pub fn find_by_cubby(&self, cubby_id: i64) -> RepositoryResult<Option<Order>> {
        let conn = self.get_conn()?;
        let order = conn
            .query_row(
                "SELECT order_id, cubby_id, remaining_items, created_at, updated_at
                 FROM orders WHERE cubby_id = ?1",
                params![cubby_id],
                |row| self.map_order_row(row),
            )
            .optional()?;
        Ok(order)
    }

    /// 按 SKU 选最优待分拣订单
    ///
    /// 选取规则：含该 SKU 未扫明细的订单里，剩余件数最少者优先
    /// （快扫完的订单先完结，格口周转更快），并列取订单号最小，
    /// 保证结果确定
    pub fn find_best_pending_by_sku(&self, sku: &str) -> RepositoryResult<Option<Order>> {
        let conn = self.get_conn()?;
        let order = conn
            .query_row(
                "SELECT o.order_id, o.cubby_id, o.remaining_items, o.created_at, o.updated_at
                 FROM orders o
                 JOIN order_item i ON i.order_id = o.order_id
                 WHERE i.sku = ?1 AND i.scanned = 0
                 ORDER BY o.remaining_items ASC, o.order_id ASC
                 LIMIT 1",
                params![sku],
                |row| self.map_order_row(row),
            )
            .optional()?;
        Ok(order)
    }

    /// 查询订单明细
    pub fn list_items(&self, order_id: &str) -> RepositoryResult<Vec<OrderItem>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT order_id, sku, scanned, scanned_at
             FROM order_item WHERE order_id = ?1 ORDER BY sku ASC",
        )?;
        let items = stmt
            .query_map(params![order_id], |row| {
                Ok(OrderItem {
                    order_id: row.get("order_id")?,
                    sku: row.get("sku")?,
                    scanned: row.get::<_, i64>("scanned")? != 0,
                    scanned_at: row.get::<_, Option<DateTime<Utc>>>("scanned_at")?,
                })
            })?
            .collect::<Result<Vec<OrderItem>, _>>()?;
        Ok(items)
    }

    /// 未扫明细数（测试用不变量核对）
    pub fn count_unscanned(&self, order_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let n = conn.query_row(
            "SELECT COUNT(*) FROM order_item WHERE order_id = ?1 AND scanned = 0",
            params![order_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    // ==========================================
    // 条件更新接口
    // ==========================================

    /// 挂接格口: cubby_id NULL -> 具体格口
    ///
    /// 条件更新保证一个订单只会挂接一次；并发首扫时
    /// 输掉的一方会得到 0 行，由调用方回收自己抢到的格口
    ///
    /// # 错误
    /// - `ConditionalUpdateConflict`: 订单已挂接其他格口
    /// - `NotFound`: 订单不存在
    pub fn assign_cubby(&self, order_id: &str, cubby_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows_affected = conn.execute(
            "UPDATE orders SET cubby_id = ?2, updated_at = ?3
             WHERE order_id = ?1 AND cubby_id IS NULL",
            params![order_id, cubby_id, Utc::now()],
        )?;

        if rows_affected == 0 {
            let existing: Option<Option<i64>> = conn
                .query_row(
                    "SELECT cubby_id FROM orders WHERE order_id = ?1",
                    params![order_id],
                    |row| row.get(0),
                )
                .optional()?;

            return match existing {
                Some(Some(actual)) => Err(RepositoryError::conflict(
                    "Order",
                    order_id,
                    format!("订单已挂接格口{}", actual),
                )),
                Some(None) => Err(RepositoryError::InternalError(format!(
                    "订单{}条件挂接0行但 cubby_id 为空，疑似连接不一致",
                    order_id
                ))),
                None => Err(RepositoryError::not_found("Order", order_id)),
            };
        }
        Ok(())
    }

    /// 摘除格口挂接（释放策略用）
    ///
    /// 条件限定当前挂接就是该格口，防止误摘他人
    ///
    /// # 返回
    /// - Ok(true): 本次摘除成功
    /// - Ok(false): 订单不存在或挂接已变化（无事发生）
    pub fn clear_cubby(&self, order_id: &str, cubby_id: i64) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let rows_affected = conn.execute(
            "UPDATE orders SET cubby_id = NULL, updated_at = ?3
             WHERE order_id = ?1 AND cubby_id = ?2",
            params![order_id, cubby_id, Utc::now()],
        )?;
        Ok(rows_affected > 0)
    }

    /// 明细置已扫: scanned 0 -> 1
    ///
    /// 同一 (订单, SKU) 只会置位一次，重复扫码在这里被拒绝
    ///
    /// # 错误
    /// - `ConditionalUpdateConflict`: 明细已是已扫状态（重复扫码）
    /// - `NotFound`: 订单中无此明细
    pub fn mark_item_scanned(&self, order_id: &str, sku: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows_affected = conn.execute(
            "UPDATE order_item SET scanned = 1, scanned_at = ?3
             WHERE order_id = ?1 AND sku = ?2 AND scanned = 0",
            params![order_id, sku, Utc::now()],
        )?;

        if rows_affected == 0 {
            let exists: Option<i64> = conn
                .query_row(
                    "SELECT scanned FROM order_item WHERE order_id = ?1 AND sku = ?2",
                    params![order_id, sku],
                    |row| row.get(0),
                )
                .optional()?;

            return match exists {
                Some(_) => Err(RepositoryError::conflict(
                    "OrderItem",
                    format!("{}/{}", order_id, sku),
                    "明细已扫码",
                )),
                None => Err(RepositoryError::not_found(
                    "OrderItem",
                    format!("{}/{}", order_id, sku),
                )),
            };
        }
        Ok(())
    }

    /// 剩余件数原子递减并返回新值
    ///
    /// 相对递减 + remaining_items > 0 守卫：并发下每次成功扫码
    /// 恰好贡献 -1，计数永不为负
    ///
    /// # 错误
    /// - `BusinessRuleViolation`: 计数已为 0（与明细状态不一致，数据质量问题）
    /// - `NotFound`: 订单不存在
    pub fn decrement_remaining(&self, order_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let rows_affected = conn.execute(
            "UPDATE orders SET remaining_items = remaining_items - 1, updated_at = ?2
             WHERE order_id = ?1 AND remaining_items > 0",
            params![order_id, Utc::now()],
        )?;

        if rows_affected == 0 {
            let remaining: Option<i64> = conn
                .query_row(
                    "SELECT remaining_items FROM orders WHERE order_id = ?1",
                    params![order_id],
                    |row| row.get(0),
                )
                .optional()?;

            return match remaining {
                Some(_) => Err(RepositoryError::BusinessRuleViolation(format!(
                    "订单{}剩余件数已为0，无法再递减（与明细不一致）",
                    order_id
                ))),
                None => Err(RepositoryError::not_found("Order", order_id)),
            };
        }

        // 同一把连接锁内回读，返回递减后的当前值
        let remaining: i64 = conn.query_row(
            "SELECT remaining_items FROM orders WHERE order_id = ?1",
            params![order_id],
            |row| row.get(0),
        )?;
        Ok(remaining)
    }

    // ==========================================
    // 接单接口（种子脚本/测试用，生产接单在外部系统）
    // ==========================================

    /// 新增订单
    pub fn insert(&self, order_id: &str, remaining_items: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO orders (order_id, cubby_id, remaining_items, created_at, updated_at)
             VALUES (?1, NULL, ?2, ?3, ?3)",
            params![order_id, remaining_items, Utc::now()],
        )?;
        Ok(())
    }

    /// 新增订单明细
    pub fn insert_item(&self, order_id: &str, sku: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO order_item (order_id, sku, scanned, scanned_at)
             VALUES (?1, ?2, 0, NULL)",
            params![order_id, sku],
        )?;
        Ok(())
    }
}
