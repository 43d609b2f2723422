// ==========================================
// 播种墙扫码分拣系统 - 扫码 API
// ==========================================
// 职责: 编排一次扫码事件的完整流程
//   解析商品 → 定位订单 → 挂接/复用格口 → 互斥闸门
//   → 扫码记账 → 随机配色 → 亮灯通知 → 响应
// 以及独立入口: 放置确认
// 红线: 通知与审计都是 best-effort，失败不回滚扫码
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::scan_log::ScanLog;
use crate::domain::types::{IndicatorColor, OrderPhase, ScanOutcome};
use crate::engine::allocator::CubbyAllocator;
use crate::engine::events::{OptionalNotifier, PlacementNotice};
use crate::engine::progress::OrderProgressTracker;
use crate::repository::error::RepositoryError;
use crate::repository::order_repo::OrderRepository;
use crate::repository::product_repo::ProductRepository;
use crate::repository::scan_log_repo::ScanLogRepository;

// ==========================================
// 请求/响应 DTO
// ==========================================
// 外部 JSON 字段名为 camelCase（扫码枪网关约定）

/// 扫码请求
///
/// order_id 可选：带单号为“指定订单”模式，
/// 不带则按条码搜“最优待分拣订单”
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanItemRequest {
    pub scan_code: String,
    #[serde(default)]
    pub order_id: Option<String>,
}

/// 扫码响应
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanItemResponse {
    pub assigned_cubby: i64,
    pub product_name: String,
    pub color_index: usize,
}

/// 放置确认请求
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPlacementRequest {
    pub cubby_id: i64,
}

/// 放置确认响应
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPlacementResponse {
    pub message: String,
}

// ==========================================
// ScanApi - 扫码 API
// ==========================================

/// 扫码API
///
/// 职责：
/// 1. 扫码事件编排（订单生命周期: 无格口 → 挂接空闲 → 投料中 → 空闲 … → 完单）
/// 2. 放置确认（含可配置的完单释放策略）
/// 3. 扫码审计（scan_log）
/// 4. 亮灯通知发布
pub struct ScanApi {
    product_repo: Arc<ProductRepository>,
    order_repo: Arc<OrderRepository>,
    scan_log_repo: Arc<ScanLogRepository>,
    allocator: Arc<CubbyAllocator>,
    progress: Arc<OrderProgressTracker>,
    config: Arc<ConfigManager>,
    notifier: OptionalNotifier,
}

impl ScanApi {
    /// 创建新的ScanApi实例
    ///
    /// # 参数
    /// - product_repo: 商品仓储
    /// - order_repo: 订单仓储
    /// - scan_log_repo: 扫码日志仓储
    /// - allocator: 格口分配引擎
    /// - progress: 扫码进度引擎
    /// - config: 配置管理器
    /// - notifier: 亮灯通知发布者（可为空，空则只记日志）
    pub fn new(
        product_repo: Arc<ProductRepository>,
        order_repo: Arc<OrderRepository>,
        scan_log_repo: Arc<ScanLogRepository>,
        allocator: Arc<CubbyAllocator>,
        progress: Arc<OrderProgressTracker>,
        config: Arc<ConfigManager>,
        notifier: OptionalNotifier,
    ) -> Self {
        Self {
            product_repo,
            order_repo,
            scan_log_repo,
            allocator,
            progress,
            config,
            notifier,
        }
    }

    // ==========================================
    // 扫码入口
    // ==========================================

    /// 处理一次扫码事件
    ///
    /// # 错误
    /// - `ProductNotFound` / `OrderNotFound` / `NoPendingOrder`: 解析失败
    /// - `NoCubbyAvailable`: 格口池耗尽
    /// - `CubbyBusy`: 上一件放置未确认（互斥闸门拒绝）
    /// - `DuplicateScan` / `ItemNotFound`: 记账被拒
    pub fn scan_item(&self, request: &ScanItemRequest) -> ApiResult<ScanItemResponse> {
        // 参数验证
        let sku = request.scan_code.trim();
        if sku.is_empty() {
            return Err(ApiError::InvalidInput("条码不能为空".to_string()));
        }
        if let Some(ref oid) = request.order_id {
            if oid.trim().is_empty() {
                return Err(ApiError::InvalidInput("订单号不能为空".to_string()));
            }
        }

        // 1. 商品目录解析
        let product = match self.product_repo.find_by_sku(sku)? {
            Some(p) => p,
            None => {
                self.audit(None, sku, None, ScanOutcome::ProductNotFound, None);
                return Err(ApiError::ProductNotFound(sku.to_string()));
            }
        };

        // 2. 定位目标订单（指定单号 / 最优待分拣两种来源）
        let order = match request.order_id {
            Some(ref oid) => {
                let oid = oid.trim();
                match self.order_repo.find_by_id(oid)? {
                    Some(o) => o,
                    None => {
                        self.audit(Some(oid), sku, None, ScanOutcome::OrderNotFound, None);
                        return Err(ApiError::OrderNotFound(oid.to_string()));
                    }
                }
            }
            None => match self.progress.resolve_best_pending(sku)? {
                Some(o) => o,
                None => {
                    self.audit(None, sku, None, ScanOutcome::NoPendingOrder, None);
                    return Err(ApiError::NoPendingOrder(sku.to_string()));
                }
            },
        };
        let order_id = order.order_id.clone();
        debug!(
            "目标订单就位: order_id={}, phase={}, remaining={}",
            order_id,
            order.phase(),
            order.remaining_items
        );

        // 3. 格口解析：已挂接直接复用，否则占一个新格口
        let cubby_id = match order.cubby_id {
            Some(id) => id,
            None => self.claim_and_assign(&order_id, sku)?,
        };

        // 4./5. 互斥闸门：投料中标志的条件翻转就是检查本身，
        // 不做先读后判（并发下读到的快照不可信）
        if let Err(e) = self.allocator.mark_in_progress(cubby_id) {
            return match e {
                RepositoryError::ConditionalUpdateConflict { .. } => {
                    self.audit(
                        Some(&order_id),
                        sku,
                        Some(cubby_id),
                        ScanOutcome::CubbyBusy,
                        None,
                    );
                    Err(ApiError::CubbyBusy { cubby_id })
                }
                other => Err(other.into()),
            };
        }
        debug!(
            "互斥闸门放行: cubby_id={}, phase={}",
            cubby_id,
            OrderPhase::CubbyInProgress
        );

        // 6. 扫码记账；被拒时回滚投料中标志，否则格口会被卡死
        let remaining = match self.progress.record_scan(&order_id, sku) {
            Ok(n) => n,
            Err(e) => {
                self.rollback_in_progress(cubby_id);
                return match e {
                    RepositoryError::ConditionalUpdateConflict { .. } => {
                        self.audit(
                            Some(&order_id),
                            sku,
                            Some(cubby_id),
                            ScanOutcome::DuplicateScan,
                            None,
                        );
                        Err(ApiError::DuplicateScan {
                            order_id: order_id.clone(),
                            sku: sku.to_string(),
                        })
                    }
                    RepositoryError::NotFound { ref entity, .. } if entity == "OrderItem" => {
                        self.audit(
                            Some(&order_id),
                            sku,
                            Some(cubby_id),
                            ScanOutcome::ItemNotFound,
                            None,
                        );
                        Err(ApiError::ItemNotFound {
                            order_id: order_id.clone(),
                            sku: sku.to_string(),
                        })
                    }
                    other => {
                        self.audit(
                            Some(&order_id),
                            sku,
                            Some(cubby_id),
                            ScanOutcome::InternalError,
                            Some(other.to_string()),
                        );
                        Err(other.into())
                    }
                };
            }
        };

        // 7. 随机配色（纯展示值，不落库）
        let color = IndicatorColor::pick_random();

        // 8. 亮灯通知 + 审计，均为 best-effort
        self.notifier.publish_best_effort(PlacementNotice {
            cubby_id,
            color,
            remaining_items: remaining,
        });
        self.audit(
            Some(&order_id),
            sku,
            Some(cubby_id),
            ScanOutcome::Assigned,
            Some(format!("product={}, remaining={}", product.name, remaining)),
        );

        info!(
            "扫码完成: order_id={}, sku={}, cubby_id={}, color={}, remaining={}",
            order_id, sku, cubby_id, color, remaining
        );

        // 9. 响应
        Ok(ScanItemResponse {
            assigned_cubby: cubby_id,
            product_name: product.name,
            color_index: color.index(),
        })
    }

    /// 首扫路径：占格口并挂接到订单
    ///
    /// 并发首扫时只有一方能完成挂接（条件更新），
    /// 落败方回收自己占到的格口并沿用胜者的挂接
    fn claim_and_assign(&self, order_id: &str, sku: &str) -> ApiResult<i64> {
        let claimed = match self.allocator.claim()? {
            Some(id) => id,
            None => {
                self.audit(
                    Some(order_id),
                    sku,
                    None,
                    ScanOutcome::NoCubbyAvailable,
                    None,
                );
                return Err(ApiError::NoCubbyAvailable);
            }
        };

        match self.order_repo.assign_cubby(order_id, claimed) {
            Ok(()) => {
                debug!("格口挂接完成: order_id={}, cubby_id={}", order_id, claimed);
                Ok(claimed)
            }
            Err(RepositoryError::ConditionalUpdateConflict { .. }) => {
                // 并发首扫落败：退回自己的格口，改用胜者的
                if let Err(e) = self.allocator.release(claimed) {
                    warn!(
                        "落败格口回收失败: cubby_id={}, error={}（格口将滞留，需运维释放）",
                        claimed, e
                    );
                }
                let winner = self
                    .order_repo
                    .find_by_id(order_id)?
                    .and_then(|o| o.cubby_id)
                    .ok_or_else(|| {
                        ApiError::InternalError(format!(
                            "订单{}挂接冲突但重读仍无格口",
                            order_id
                        ))
                    })?;
                debug!(
                    "并发首扫落败，沿用已挂接格口: order_id={}, cubby_id={}",
                    order_id, winner
                );
                Ok(winner)
            }
            Err(other) => Err(other.into()),
        }
    }

    // ==========================================
    // 放置确认入口
    // ==========================================

    /// 放置确认
    ///
    /// 清投料中标志（幂等）。若开启完单释放策略且该格口
    /// 的订单已完单，则顺带摘挂接并释放格口；策略步骤为
    /// best-effort，不影响确认本身的结果
    ///
    /// # 错误
    /// - `CubbyNotFound`: 格口不存在
    pub fn confirm_placement(&self, cubby_id: i64) -> ApiResult<ConfirmPlacementResponse> {
        if let Err(e) = self.allocator.confirm_placement(cubby_id) {
            return match e {
                RepositoryError::NotFound { .. } => Err(ApiError::CubbyNotFound(cubby_id)),
                other => Err(other.into()),
            };
        }
        debug!("放置确认完成: cubby_id={}", cubby_id);

        if self.release_on_complete_enabled() {
            self.try_release_if_complete(cubby_id);
        }

        Ok(ConfirmPlacementResponse {
            message: format!("格口{}放置确认完成", cubby_id),
        })
    }

    fn release_on_complete_enabled(&self) -> bool {
        self.config.release_on_complete().unwrap_or_else(|e| {
            warn!("读取完单释放配置失败，按关闭处理: {}", e);
            false
        })
    }

    /// 完单释放策略（配置开启时生效）
    ///
    /// 顺序固定：先摘订单挂接，再释放格口，避免出现
    /// “格口已空闲但订单仍指着它”的窗口
    fn try_release_if_complete(&self, cubby_id: i64) {
        let occupant = match self.order_repo.find_by_cubby(cubby_id) {
            Ok(o) => o,
            Err(e) => {
                warn!("完单释放查询失败（已忽略）: cubby_id={}, error={}", cubby_id, e);
                return;
            }
        };

        let Some(order) = occupant else { return };
        if !order.is_complete() {
            return;
        }

        match self.order_repo.clear_cubby(&order.order_id, cubby_id) {
            Ok(true) => match self.allocator.release(cubby_id) {
                Ok(()) => {
                    info!(
                        "完单释放: order_id={}, cubby_id={}",
                        order.order_id, cubby_id
                    );
                }
                Err(e) => {
                    warn!(
                        "完单释放格口失败（已摘挂接）: cubby_id={}, error={}",
                        cubby_id, e
                    );
                }
            },
            Ok(false) => {
                debug!(
                    "完单释放跳过（挂接已变化）: order_id={}, cubby_id={}",
                    order.order_id, cubby_id
                );
            }
            Err(e) => {
                warn!(
                    "完单释放摘挂接失败（已忽略）: order_id={}, error={}",
                    order.order_id, e
                );
            }
        }
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    /// 投料中标志回滚（记账被拒后的补偿）
    fn rollback_in_progress(&self, cubby_id: i64) {
        if let Err(e) = self.allocator.confirm_placement(cubby_id) {
            warn!(
                "投料中标志回滚失败: cubby_id={}, error={}（格口需人工确认解锁）",
                cubby_id, e
            );
        }
    }

    /// 追加扫码审计（best-effort）
    fn audit(
        &self,
        order_id: Option<&str>,
        sku: &str,
        cubby_id: Option<i64>,
        outcome: ScanOutcome,
        detail: Option<String>,
    ) {
        let log = ScanLog::record(order_id, sku, cubby_id, outcome, detail);
        if let Err(e) = self.scan_log_repo.append(&log) {
            warn!("扫码日志写入失败（已忽略）: sku={}, error={}", sku, e);
        }
    }
}
