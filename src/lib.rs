// ==========================================
// 播种墙扫码分拣系统 - 核心库
// ==========================================
// 技术栈: Axum + Rust + SQLite
// 系统定位: 播种墙格口分配与亮灯通知服务
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 通知适配层 - 亮灯通道
pub mod notify;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/schema 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 装配与 HTTP 边界
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{IndicatorColor, OrderPhase, ScanOutcome, PALETTE_SIZE};

// 领域实体
pub use domain::{Cubby, Order, OrderItem, Product, ScanLog};

// 引擎
pub use engine::{
    CubbyAllocator, NoOpNotifier, OptionalNotifier, OrderProgressTracker, PlacementNotice,
    PlacementNotifier,
};

// 通知适配
pub use notify::{
    IndicatorChannel, InMemoryIndicatorChannel, LoggingIndicatorChannel, NotifierConfig,
    QueuedNotifier,
};

// API
pub use api::{ScanApi, ScanItemRequest, ScanItemResponse};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "播种墙扫码分拣系统";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";
