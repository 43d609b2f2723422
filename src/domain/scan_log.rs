// ==========================================
// 播种墙扫码分拣系统 - 扫码日志领域模型
// ==========================================
// 用途: 审计追踪，每次扫码尝试（无论成败）追加一条
// 写入为 best-effort，失败只记日志不影响扫码结果
// ==========================================

use crate::domain::types::ScanOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// ScanLog - 扫码日志
// ==========================================
// 对齐: scan_log 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanLog {
    pub log_id: String,           // 日志ID (uuid v4)
    pub order_id: Option<String>, // 命中的订单（解析失败时为 None）
    pub sku: String,              // 扫到的条码
    pub cubby_id: Option<i64>,    // 涉及的格口（未走到分配时为 None）
    pub outcome: String,          // 结果码（ScanOutcome）
    pub detail: Option<String>,   // 详细描述
    pub created_at: DateTime<Utc>,
}

impl ScanLog {
    /// 构造一条扫码日志
    pub fn record(
        order_id: Option<&str>,
        sku: &str,
        cubby_id: Option<i64>,
        outcome: ScanOutcome,
        detail: Option<String>,
    ) -> Self {
        Self {
            log_id: Uuid::new_v4().to_string(),
            order_id: order_id.map(|s| s.to_string()),
            sku: sku.to_string(),
            cubby_id,
            outcome: outcome.as_str().to_string(),
            detail,
            created_at: Utc::now(),
        }
    }
}
