// ==========================================
// 播种墙扫码分拣系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value)
// 所有配置都有内置默认值，空库可直接运行
// ==========================================

use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 写入配置值（upsert）
    pub fn set_config(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            "INSERT INTO config_kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value],
        )?;
        Ok(())
    }

    // ==========================================
    // 类型化读取接口（带默认值）
    // ==========================================

    /// 格口占用重试次数上限
    pub fn claim_retry_limit(&self) -> Result<i64, Box<dyn Error>> {
        let value = self
            .get_config_value(config_keys::CLAIM_RETRY_LIMIT)?
            .unwrap_or_default();
        Ok(value
            .parse::<i64>()
            .unwrap_or(crate::engine::allocator::DEFAULT_CLAIM_RETRY_LIMIT))
    }

    /// 完单时是否在放置确认里顺带释放格口
    pub fn release_on_complete(&self) -> Result<bool, Box<dyn Error>> {
        let value = self
            .get_config_value(config_keys::RELEASE_ON_COMPLETE)?
            .unwrap_or_default();
        Ok(matches!(value.as_str(), "1" | "true" | "TRUE"))
    }

    /// 通知主题前缀
    pub fn topic_prefix(&self) -> Result<String, Box<dyn Error>> {
        Ok(self
            .get_config_value(config_keys::TOPIC_PREFIX)?
            .unwrap_or_else(|| crate::engine::events::DEFAULT_TOPIC_PREFIX.to_string()))
    }

    /// 单条通知的通道发送超时（毫秒）
    pub fn publish_timeout_ms(&self) -> Result<u64, Box<dyn Error>> {
        let value = self
            .get_config_value(config_keys::PUBLISH_TIMEOUT_MS)?
            .unwrap_or_default();
        Ok(value.parse::<u64>().unwrap_or(1_000))
    }

    /// 通知队列容量
    pub fn queue_capacity(&self) -> Result<usize, Box<dyn Error>> {
        let value = self
            .get_config_value(config_keys::QUEUE_CAPACITY)?
            .unwrap_or_default();
        Ok(value.parse::<usize>().unwrap_or(256))
    }
}

// ==========================================
// 配置键全集
// ==========================================
pub mod config_keys {
    // 格口分配
    pub const CLAIM_RETRY_LIMIT: &str = "allocator.claim_retry_limit";
    pub const RELEASE_ON_COMPLETE: &str = "allocator.release_on_complete";

    // 亮灯通知
    pub const TOPIC_PREFIX: &str = "notify.topic_prefix";
    pub const PUBLISH_TIMEOUT_MS: &str = "notify.publish_timeout_ms";
    pub const QUEUE_CAPACITY: &str = "notify.queue_capacity";
}
