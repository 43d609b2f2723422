// ==========================================
// 播种墙扫码分拣系统 - 格口仓储
// ==========================================
// 红线: occupied / in_progress 的每次翻转都是
// 单条条件 UPDATE，靠受影响行数判定成败，
// 绝不允许先读后写（并发下会双占格口）
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::cubby::Cubby;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// CubbyRepository - 格口仓储
// ==========================================
pub struct CubbyRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CubbyRepository {
    /// 创建新的 CubbyRepository 实例
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

    fn map_row(&self, row: &Row<'_>) -> rusqlite::Result<Cubby> {
        Ok(Cubby {
            cubby_id: row.get("cubby_id")?,
            occupied: row.get::<_, i64>("occupied")? != 0,
            in_progress: row.get::<_, i64>("in_progress")? != 0,
            updated_at: row.get::<_, Option<DateTime<Utc>>>("updated_at")?,
        })
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 按格口号查询
    pub fn find_by_id(&self, cubby_id: i64) -> RepositoryResult<Option<Cubby>> {
        let conn = self.get_conn()?;
        let cubby = conn
            .query_row(
                "SELECT cubby_id, occupied, in_progress, updated_at
                 FROM cubby WHERE cubby_id = ?1",
                params![cubby_id],
                |row| self.map_row(row),
            )
            .optional()?;
        Ok(cubby)
    }

    /// 最小号空闲格口（分配候选）
    ///
    /// 只做候选选取，真正的占用由 try_claim 的条件更新决定
    pub fn find_lowest_free(&self) -> RepositoryResult<Option<i64>> {
        let conn = self.get_conn()?;
        let id = conn
            .query_row(
                "SELECT cubby_id FROM cubby WHERE occupied = 0 ORDER BY cubby_id ASC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// 空闲格口数（运维/测试用）
    pub fn count_free(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let n = conn.query_row("SELECT COUNT(*) FROM cubby WHERE occupied = 0", [], |row| {
            row.get(0)
        })?;
        Ok(n)
    }

    // ==========================================
    // 条件更新接口
    // ==========================================

    /// 尝试占用格口: occupied 0 -> 1
    ///
    /// # 返回
    /// - Ok(true): 本次调用完成了占用
    /// - Ok(false): 已被其他请求抢先占用（候选失效，调用方换下一个候选重试）
    pub fn try_claim(&self, cubby_id: i64) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let rows_affected = conn.execute(
            "UPDATE cubby SET occupied = 1, updated_at = ?2
             WHERE cubby_id = ?1 AND occupied = 0",
            params![cubby_id, Utc::now()],
        )?;
        Ok(rows_affected > 0)
    }

    /// 投料中标志: in_progress 0 -> 1
    ///
    /// 互斥闸门：同一格口在放置确认前不得再次路由。
    /// 条件更新本身就是判定，不做前置读取。
    ///
    /// # 错误
    /// - `ConditionalUpdateConflict`: 已处于投料中（上一件未确认）
    /// - `BusinessRuleViolation`: 格口未被占用（不变量保护）
    /// - `NotFound`: 格口不存在
    pub fn mark_in_progress(&self, cubby_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows_affected = conn.execute(
            "UPDATE cubby SET in_progress = 1, updated_at = ?2
             WHERE cubby_id = ?1 AND occupied = 1 AND in_progress = 0",
            params![cubby_id, Utc::now()],
        )?;

        if rows_affected == 0 {
            // 区分三种失败: 在投料中 / 未占用 / 不存在
            let state: Option<(bool, bool)> = conn
                .query_row(
                    "SELECT occupied, in_progress FROM cubby WHERE cubby_id = ?1",
                    params![cubby_id],
                    |row| {
                        Ok((
                            row.get::<_, i64>(0)? != 0,
                            row.get::<_, i64>(1)? != 0,
                        ))
                    },
                )
                .optional()?;

            return match state {
                Some((_, true)) => Err(RepositoryError::conflict(
                    "Cubby",
                    cubby_id,
                    "格口放置待确认，拒绝再次投料",
                )),
                Some((false, _)) => Err(RepositoryError::BusinessRuleViolation(format!(
                    "格口{}未被占用，不能置投料中",
                    cubby_id
                ))),
                Some((true, false)) => Err(RepositoryError::InternalError(format!(
                    "格口{}条件更新0行但状态可投，疑似连接不一致",
                    cubby_id
                ))),
                None => Err(RepositoryError::not_found("Cubby", cubby_id)),
            };
        }

        Ok(())
    }

    /// 放置确认: in_progress -> 0
    ///
    /// 幂等：对已确认的格口重复确认是成功的空操作
    /// （工人可能连按两次确认灯）
    ///
    /// # 错误
    /// - `NotFound`: 格口不存在
    pub fn confirm_placement(&self, cubby_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        // SQLite 对命中但值未变的行同样计入 changes，
        // 因此 0 行只可能是格口不存在
        let rows_affected = conn.execute(
            "UPDATE cubby SET in_progress = 0, updated_at = ?2
             WHERE cubby_id = ?1",
            params![cubby_id, Utc::now()],
        )?;

        if rows_affected == 0 {
            return Err(RepositoryError::not_found("Cubby", cubby_id));
        }
        Ok(())
    }

    /// 释放格口: occupied / in_progress 同时清零
    ///
    /// # 错误
    /// - `NotFound`: 格口不存在
    pub fn release(&self, cubby_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows_affected = conn.execute(
            "UPDATE cubby SET occupied = 0, in_progress = 0, updated_at = ?2
             WHERE cubby_id = ?1",
            params![cubby_id, Utc::now()],
        )?;

        if rows_affected == 0 {
            return Err(RepositoryError::not_found("Cubby", cubby_id));
        }
        Ok(())
    }

    // ==========================================
    // 开墙接口（种子脚本/测试用）
    // ==========================================

    /// 新增格口
    pub fn insert(&self, cubby_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO cubby (cubby_id, occupied, in_progress, updated_at)
             VALUES (?1, 0, 0, ?2)",
            params![cubby_id, Utc::now()],
        )?;
        Ok(())
    }
}
