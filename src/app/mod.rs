// ==========================================
// 播种墙扫码分拣系统 - 应用层
// ==========================================
// 职责: 依赖装配与 HTTP 边界
// ==========================================

pub mod http;
pub mod state;

// 重导出
pub use http::router;
pub use state::{get_default_db_path, AppState};
