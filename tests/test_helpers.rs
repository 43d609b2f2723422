// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成、
// 扫码环境装配与通知收集器
// ==========================================

use std::error::Error;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tempfile::NamedTempFile;

use putwall_scan::api::ScanApi;
use putwall_scan::config::ConfigManager;
use putwall_scan::db::{init_schema, open_sqlite_connection};
use putwall_scan::engine::allocator::CubbyAllocator;
use putwall_scan::engine::events::{OptionalNotifier, PlacementNotice, PlacementNotifier};
use putwall_scan::engine::progress::OrderProgressTracker;
use putwall_scan::repository::{
    CubbyRepository, OrderRepository, ProductRepository, ScanLogRepository,
};

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = Connection::open(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

// ==========================================
// 通知收集器（测试替身）
// ==========================================

/// 把发布的亮灯通知原样收集起来供断言
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    notices: Mutex<Vec<PlacementNotice>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已收集通知的快照
    pub fn notices(&self) -> Vec<PlacementNotice> {
        self.notices.lock().map(|n| n.clone()).unwrap_or_default()
    }
}

impl PlacementNotifier for CollectingNotifier {
    fn publish(
        &self,
        notice: PlacementNotice,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.notices
            .lock()
            .map_err(|e| -> Box<dyn Error + Send + Sync> {
                format!("通知收集器锁获取失败: {}", e).into()
            })?
            .push(notice);
        Ok(())
    }
}

// ==========================================
// 扫码测试环境
// ==========================================

/// 装配好的扫码测试环境（共享同一把连接）
pub struct ScanTestEnv {
    /// 临时数据库文件（随环境存活）
    pub _temp_file: NamedTempFile,
    pub db_path: String,
    pub scan_api: Arc<ScanApi>,
    pub product_repo: Arc<ProductRepository>,
    pub order_repo: Arc<OrderRepository>,
    pub cubby_repo: Arc<CubbyRepository>,
    pub scan_log_repo: Arc<ScanLogRepository>,
    pub config: Arc<ConfigManager>,
    pub notifier: Arc<CollectingNotifier>,
}

/// 创建扫码测试环境
pub fn setup_scan_env() -> ScanTestEnv {
    let (temp_file, db_path) = create_test_db().unwrap();

    let conn = Arc::new(Mutex::new(open_sqlite_connection(&db_path).unwrap()));
    let product_repo = Arc::new(ProductRepository::from_connection(conn.clone()));
    let order_repo = Arc::new(OrderRepository::from_connection(conn.clone()));
    let cubby_repo = Arc::new(CubbyRepository::from_connection(conn.clone()));
    let scan_log_repo = Arc::new(ScanLogRepository::from_connection(conn.clone()));
    let config = Arc::new(ConfigManager::from_connection(conn.clone()).unwrap());

    let allocator = Arc::new(CubbyAllocator::new(
        cubby_repo.clone(),
        config.claim_retry_limit().unwrap(),
    ));
    let progress = Arc::new(OrderProgressTracker::new(order_repo.clone()));

    let notifier = Arc::new(CollectingNotifier::new());
    let scan_api = Arc::new(ScanApi::new(
        product_repo.clone(),
        order_repo.clone(),
        scan_log_repo.clone(),
        allocator,
        progress,
        config.clone(),
        OptionalNotifier::with_notifier(notifier.clone() as Arc<dyn PlacementNotifier>),
    ));

    ScanTestEnv {
        _temp_file: temp_file,
        db_path,
        scan_api,
        product_repo,
        order_repo,
        cubby_repo,
        scan_log_repo,
        config,
        notifier,
    }
}

// ==========================================
// 种子数据辅助
// ==========================================

/// 开 n 个格口（格口号 1..=n）
pub fn seed_cubbies(env: &ScanTestEnv, n: i64) {
    for cubby_id in 1..=n {
        env.cubby_repo.insert(cubby_id).unwrap();
    }
}

/// 建一条商品目录
pub fn seed_product(env: &ScanTestEnv, sku: &str, name: &str) {
    env.product_repo.insert(sku, name).unwrap();
}

/// 建一个订单及其明细（剩余件数 = 明细数）
pub fn seed_order(env: &ScanTestEnv, order_id: &str, skus: &[&str]) {
    env.order_repo.insert(order_id, skus.len() as i64).unwrap();
    for sku in skus {
        env.order_repo.insert_item(order_id, sku).unwrap();
    }
}
