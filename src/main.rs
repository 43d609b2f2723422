// ==========================================
// 播种墙扫码分拣系统 - 服务主入口
// ==========================================
// 技术栈: Axum + Rust + SQLite
// 启动顺序: 日志 → schema → 通知任务 → AppState → HTTP
// ==========================================

use std::sync::Arc;

use putwall_scan::app::{get_default_db_path, router, AppState};
use putwall_scan::config::ConfigManager;
use putwall_scan::notify::{LoggingIndicatorChannel, NotifierConfig, QueuedNotifier};
use putwall_scan::{db, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} - 格口分配与亮灯通知服务", putwall_scan::APP_NAME);
    tracing::info!("系统版本: {}", putwall_scan::VERSION);
    tracing::info!("==================================================");

    // 获取数据库路径
    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);
    tracing::info!("使用数据库: {}", db_path);

    // 确保 schema 就绪（幂等）
    {
        let conn = db::open_sqlite_connection(&db_path)?;
        db::init_schema(&conn)?;
        if let Some(version) = db::read_schema_version(&conn)? {
            tracing::info!("schema_version: {}", version);
        }
    }

    // 启动亮灯通知后台任务
    // 未接入真实代理时走日志通道，亮灯指令可在日志里联调
    let config = ConfigManager::new(&db_path)
        .map_err(|e| anyhow::anyhow!("无法创建ConfigManager: {}", e))?;
    let notifier_config = NotifierConfig {
        topic_prefix: config
            .topic_prefix()
            .map_err(|e| anyhow::anyhow!("读取主题前缀配置失败: {}", e))?,
        publish_timeout_ms: config
            .publish_timeout_ms()
            .map_err(|e| anyhow::anyhow!("读取通知超时配置失败: {}", e))?,
        queue_capacity: config
            .queue_capacity()
            .map_err(|e| anyhow::anyhow!("读取通知队列容量配置失败: {}", e))?,
    };
    let (notifier, _notify_handle) =
        QueuedNotifier::spawn(Arc::new(LoggingIndicatorChannel), notifier_config);

    // 创建AppState
    tracing::info!("正在初始化AppState...");
    let app_state = AppState::with_notifier(db_path, Some(Arc::new(notifier)))
        .map_err(|e| anyhow::anyhow!("无法初始化AppState: {}", e))?;
    tracing::info!("AppState初始化成功");

    // 启动 HTTP 服务
    let addr = std::env::var("PUTWALL_SCAN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("HTTP 服务启动: {}", addr);

    axum::serve(listener, router(Arc::new(app_state))).await?;

    Ok(())
}
