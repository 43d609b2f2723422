// ==========================================
// 播种墙扫码分拣系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 所有仓储/引擎共享同一把连接，依赖全部显式注入，
// 测试可用内存通道/空通知替换
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::ScanApi;
use crate::config::ConfigManager;
use crate::db::open_sqlite_connection;
use crate::engine::allocator::CubbyAllocator;
use crate::engine::events::{OptionalNotifier, PlacementNotifier};
use crate::engine::progress::OrderProgressTracker;
use crate::repository::{
    CubbyRepository, OrderRepository, ProductRepository, ScanLogRepository,
};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 扫码API
    pub scan_api: Arc<ScanApi>,

    /// 配置管理器
    pub config: Arc<ConfigManager>,

    /// 格口仓储（运维查询用）
    pub cubby_repo: Arc<CubbyRepository>,
}

impl AppState {
    /// 创建AppState（不带通知发布者，亮灯只走日志）
    pub fn new(db_path: String) -> Result<Self, String> {
        Self::with_notifier(db_path, None)
    }

    /// 创建AppState并注入亮灯通知发布者
    pub fn with_notifier(
        db_path: String,
        notifier: Option<Arc<dyn PlacementNotifier>>,
    ) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        // 创建数据库连接（共享连接）
        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let product_repo = Arc::new(ProductRepository::from_connection(conn.clone()));
        let order_repo = Arc::new(OrderRepository::from_connection(conn.clone()));
        let cubby_repo = Arc::new(CubbyRepository::from_connection(conn.clone()));
        let scan_log_repo = Arc::new(ScanLogRepository::from_connection(conn.clone()));

        // ==========================================
        // 初始化配置与引擎层
        // ==========================================
        let config = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        let claim_retry_limit = config
            .claim_retry_limit()
            .map_err(|e| format!("读取占用重试配置失败: {}", e))?;
        let allocator = Arc::new(CubbyAllocator::new(cubby_repo.clone(), claim_retry_limit));
        let progress = Arc::new(OrderProgressTracker::new(order_repo.clone()));

        // ==========================================
        // 初始化API层
        // ==========================================
        let optional_notifier = match notifier {
            Some(n) => OptionalNotifier::with_notifier(n),
            None => OptionalNotifier::none(),
        };

        let scan_api = Arc::new(ScanApi::new(
            product_repo,
            order_repo,
            scan_log_repo,
            allocator,
            progress,
            config.clone(),
            optional_notifier,
        ));

        Ok(Self {
            db_path,
            scan_api,
            config,
            cubby_repo,
        })
    }
}

/// 解析默认数据库路径
///
/// 优先级: 环境变量 PUTWALL_SCAN_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("PUTWALL_SCAN_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    // 先给一个默认回退值，后续如果能拿到 data_dir 再覆盖。
    let mut path = PathBuf::from("./putwall_scan.db");

    // 尝试获取用户数据目录
    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("putwall-scan-dev");
        }
        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("putwall-scan");
        }

        if let Err(e) = std::fs::create_dir_all(&path) {
            tracing::warn!("创建数据目录失败，回退到当前目录: {}", e);
            return "./putwall_scan.db".to_string();
        }
        path = path.join("putwall_scan.db");
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    // 注意：AppState::new() 的测试需要真实的数据库文件
    // 这些测试在集成测试中进行
}
