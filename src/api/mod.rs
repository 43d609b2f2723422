// ==========================================
// 播种墙扫码分拣系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供 HTTP 边界调用
// 约定: 本层只返回 ApiResult，状态码映射在 app::http
// ==========================================

pub mod error;
pub mod scan_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use scan_api::{
    ConfirmPlacementRequest, ConfirmPlacementResponse, ScanApi, ScanItemRequest, ScanItemResponse,
};
