// ==========================================
// 播种墙扫码分拣系统 - 订单领域模型
// ==========================================
// 订单及明细由外部接单流程写入，本核心只做
// 格口挂接与扫码进度两类变更，从不删除
// ==========================================

use crate::domain::types::OrderPhase;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Order - 订单
// ==========================================
// 对齐: orders 表
// remaining_items 恒等于未扫明细数，由条件递减维护，永不为负
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,       // 订单号（主键）
    pub cubby_id: Option<i64>,  // 已挂接格口（NULL=尚未分配）
    pub remaining_items: i64,   // 剩余件数

    // ===== 审计字段 =====
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    /// 订单是否已全部扫完
    pub fn is_complete(&self) -> bool {
        self.remaining_items == 0
    }

    /// 派生扫码阶段（不含 in_progress 维度，完整判定见 ScanApi）
    pub fn phase(&self) -> OrderPhase {
        match self.cubby_id {
            None => OrderPhase::NoCubby,
            Some(_) if self.is_complete() => OrderPhase::Complete,
            Some(_) => OrderPhase::CubbyIdle,
        }
    }
}

// ==========================================
// OrderItem - 订单明细
// ==========================================
// 对齐: order_item 表，主键 (order_id, sku)
// scanned 只会被成功扫码置位一次
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_id: String,
    pub sku: String,
    pub scanned: bool,
    pub scanned_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(cubby_id: Option<i64>, remaining: i64) -> Order {
        Order {
            order_id: "ORD1".to_string(),
            cubby_id,
            remaining_items: remaining,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_phase_derivation() {
        assert_eq!(order(None, 2).phase(), OrderPhase::NoCubby);
        assert_eq!(order(Some(1), 2).phase(), OrderPhase::CubbyIdle);
        assert_eq!(order(Some(1), 0).phase(), OrderPhase::Complete);
    }
}
