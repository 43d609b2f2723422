// ==========================================
// 播种墙扫码分拣系统 - HTTP 边界
// ==========================================
// 职责: 路由声明、DTO 进出、ApiError -> 状态码映射
// 红线: 状态码映射只在这里发生，API 层不感知 HTTP
// ==========================================

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::error::ApiError;
use crate::api::scan_api::{ConfirmPlacementRequest, ScanItemRequest};
use crate::app::state::AppState;

// ==========================================
// 错误响应（返回给扫码枪网关/前端）
// ==========================================

/// 错误响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: String,

    /// 错误消息
    pub message: String,

    /// 详细信息（可选）
    pub details: Option<serde_json::Value>,
}

/// ApiError 的错误代码
fn error_code(err: &ApiError) -> &'static str {
    match err {
        ApiError::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
        ApiError::OrderNotFound(_) => "ORDER_NOT_FOUND",
        ApiError::NoPendingOrder(_) => "NO_PENDING_ORDER",
        ApiError::CubbyNotFound(_) => "CUBBY_NOT_FOUND",
        ApiError::NoCubbyAvailable => "NO_CUBBY_AVAILABLE",
        ApiError::CubbyBusy { .. } => "CUBBY_BUSY",
        ApiError::DuplicateScan { .. } => "DUPLICATE_SCAN",
        ApiError::ItemNotFound { .. } => "ITEM_NOT_FOUND",
        ApiError::InvalidInput(_) => "INVALID_INPUT",
        ApiError::NotFound(_) => "NOT_FOUND",
        ApiError::Conflict(_) => "CONFLICT",
        ApiError::BusinessRuleViolation(_) => "BUSINESS_RULE_VIOLATION",
        ApiError::DatabaseError(_) => "DATABASE_ERROR",
        ApiError::InternalError(_) => "INTERNAL_ERROR",
        ApiError::Other(_) => "OTHER_ERROR",
    }
}

/// ApiError 的 HTTP 状态码
fn status_code(err: &ApiError) -> StatusCode {
    match err {
        ApiError::ProductNotFound(_)
        | ApiError::OrderNotFound(_)
        | ApiError::NoPendingOrder(_)
        | ApiError::CubbyNotFound(_)
        | ApiError::ItemNotFound { .. }
        | ApiError::NotFound(_) => StatusCode::NOT_FOUND,

        ApiError::NoCubbyAvailable | ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,

        ApiError::CubbyBusy { .. } | ApiError::DuplicateScan { .. } | ApiError::Conflict(_) => {
            StatusCode::CONFLICT
        }

        ApiError::BusinessRuleViolation(_) => StatusCode::UNPROCESSABLE_ENTITY,

        ApiError::DatabaseError(_) | ApiError::InternalError(_) | ApiError::Other(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// 将 ApiError 渲染为 HTTP 响应
fn map_api_error(err: ApiError) -> Response {
    let status = status_code(&err);
    let body = ErrorResponse {
        code: error_code(&err).to_string(),
        message: err.to_string(),
        details: match &err {
            ApiError::CubbyBusy { cubby_id } => {
                Some(serde_json::json!({ "cubby_id": cubby_id }))
            }
            ApiError::DuplicateScan { order_id, sku } => {
                Some(serde_json::json!({ "order_id": order_id, "sku": sku }))
            }
            _ => None,
        },
    };
    (status, Json(body)).into_response()
}

// ==========================================
// 路由处理函数
// ==========================================
// rusqlite 为同步访问，业务调用放 spawn_blocking，
// 不占用 HTTP 工作线程

async fn scan_item(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ScanItemRequest>,
) -> Response {
    let result =
        tokio::task::spawn_blocking(move || state.scan_api.scan_item(&request)).await;

    match result {
        Ok(Ok(response)) => (StatusCode::OK, Json(response)).into_response(),
        Ok(Err(e)) => map_api_error(e),
        Err(e) => map_api_error(ApiError::InternalError(format!("任务执行失败: {}", e))),
    }
}

async fn confirm_placement(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ConfirmPlacementRequest>,
) -> Response {
    let result =
        tokio::task::spawn_blocking(move || state.scan_api.confirm_placement(request.cubby_id))
            .await;

    match result {
        Ok(Ok(response)) => (StatusCode::OK, Json(response)).into_response(),
        Ok(Err(e)) => map_api_error(e),
        Err(e) => map_api_error(ApiError::InternalError(format!("任务执行失败: {}", e))),
    }
}

// ==========================================
// 路由装配
// ==========================================

/// 构建服务路由
///
/// CORS 全放开：扫码枪网关与看板前端跨域直连
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/scan-item", post(scan_item))
        .route("/confirm-placement", post(confirm_placement))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
