// ==========================================
// 播种墙扫码分拣系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository错误为用户友好的错误消息
// 原则: 每种错误信息包含显式原因（可解释性）；
// HTTP 状态码映射只发生在传输边界（app::http）
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 扫码流程错误（边界映射为 404/400/409）
    // ==========================================
    #[error("商品目录中无此条码: sku={0}")]
    ProductNotFound(String),

    #[error("订单不存在: order_id={0}")]
    OrderNotFound(String),

    #[error("无待分拣订单匹配该条码: sku={0}")]
    NoPendingOrder(String),

    #[error("格口不存在: cubby_id={0}")]
    CubbyNotFound(i64),

    #[error("无可用格口")]
    NoCubbyAvailable,

    #[error("格口{cubby_id}放置待确认，请先按灯确认上一件")]
    CubbyBusy { cubby_id: i64 },

    #[error("重复扫码: order_id={order_id}, sku={sku}")]
    DuplicateScan { order_id: String, sku: String },

    #[error("订单中无此明细: order_id={order_id}, sku={sku}")]
    ItemNotFound { order_id: String, sku: String },

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("状态冲突: {0}")]
    Conflict(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将Repository层的技术错误转换为用户友好的业务错误。
// 扫码流程里有业务含义的冲突（格口忙/重复扫码）由
// ScanApi 按上下文显式转换，这里只做兜底映射
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::ConditionalUpdateConflict { entity, id, message } => {
                ApiError::Conflict(format!("{}(id={}): {}", entity, id, message))
            }

            RepositoryError::DatabaseConnectionError(msg)
            | RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }

            RepositoryError::BusinessRuleViolation(msg) => ApiError::BusinessRuleViolation(msg),
            RepositoryError::ValidationError(msg) => ApiError::InvalidInput(msg),

            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_conversion() {
        let repo_err = RepositoryError::not_found("Order", "ORD9");
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("Order"));
                assert!(msg.contains("ORD9"));
            }
            _ => panic!("Expected NotFound"),
        }

        let repo_err = RepositoryError::conflict("Cubby", 2, "格口放置待确认");
        let api_err: ApiError = repo_err.into();
        assert!(matches!(api_err, ApiError::Conflict(_)));
    }
}
