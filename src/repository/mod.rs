// ==========================================
// 播种墙扫码分拣系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入；
// 共享标志/计数器的写入一律条件更新 + 行数判定
// ==========================================

pub mod cubby_repo;
pub mod error;
pub mod order_repo;
pub mod product_repo;
pub mod scan_log_repo;

// 重导出核心仓储
pub use cubby_repo::CubbyRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use order_repo::OrderRepository;
pub use product_repo::ProductRepository;
pub use scan_log_repo::ScanLogRepository;
