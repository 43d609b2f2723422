// ==========================================
// 播种墙扫码分拣系统 - 扫码进度引擎
// ==========================================
// 职责: 待分拣订单选取、扫码记账
// 红线: 记账 = 明细条件置位 + 计数相对递减，
// 两步各自单实体原子，顺序固定（先明细后计数）
// ==========================================

use crate::domain::order::Order;
use crate::repository::error::RepositoryResult;
use crate::repository::order_repo::OrderRepository;
use std::sync::Arc;
use tracing::debug;

// ==========================================
// OrderProgressTracker - 扫码进度引擎
// ==========================================
pub struct OrderProgressTracker {
    order_repo: Arc<OrderRepository>,
}

impl OrderProgressTracker {
    /// 构造函数
    pub fn new(order_repo: Arc<OrderRepository>) -> Self {
        Self { order_repo }
    }

    /// 按 SKU 选最优待分拣订单
    ///
    /// 负载均衡启发式：剩余件数最少者优先（快完的先完，
    /// 格口早释放），并列取订单号最小
    ///
    /// # 返回
    /// - Ok(Some(order)): 命中的订单
    /// - Ok(None): 无订单含该 SKU 的未扫明细
    pub fn resolve_best_pending(&self, sku: &str) -> RepositoryResult<Option<Order>> {
        let order = self.order_repo.find_best_pending_by_sku(sku)?;
        if let Some(ref o) = order {
            debug!(
                "最优待分拣订单: sku={}, order_id={}, remaining={}",
                sku, o.order_id, o.remaining_items
            );
        }
        Ok(order)
    }

    /// 记一次成功扫码，返回递减后的剩余件数
    ///
    /// 顺序：先把明细条件置位（重复扫码在这一步被拒，
    /// 不会走到递减），再对计数做相对递减。每次置位
    /// 成功恰好换来一次 -1，并发下不丢减、不重减。
    ///
    /// # 错误
    /// - `ConditionalUpdateConflict`: 明细已扫（重复扫码）
    /// - `NotFound`: 订单或明细不存在
    /// - `BusinessRuleViolation`: 计数与明细不一致（数据质量）
    pub fn record_scan(&self, order_id: &str, sku: &str) -> RepositoryResult<i64> {
        self.order_repo.mark_item_scanned(order_id, sku)?;
        let remaining = self.order_repo.decrement_remaining(order_id)?;
        debug!(
            "扫码记账完成: order_id={}, sku={}, remaining={}",
            order_id, sku, remaining
        );
        Ok(remaining)
    }
}
