// ==========================================
// 播种墙扫码分拣系统 - 亮灯通知发布
// ==========================================
// 职责: 定义亮灯通知发布 trait，实现依赖倒置
// 说明: Engine 层定义 trait，notify 层实现队列适配器
// 契约: 每次成功扫码恰好发布一条；发布失败只记日志，
// 永不反噬扫码结果
// ==========================================

use crate::domain::types::IndicatorColor;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

/// 通知主题前缀默认值（完整主题: {prefix}/{cubby_id}/item）
pub const DEFAULT_TOPIC_PREFIX: &str = "cubbie";

// ==========================================
// 亮灯通知
// ==========================================

/// 亮灯通知
///
/// 按格口号定位指示灯通道，颜色为本次扫码随机选取的展示色
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementNotice {
    /// 格口号
    pub cubby_id: i64,
    /// 亮灯颜色
    pub color: IndicatorColor,
    /// 订单剩余件数（递减后）
    pub remaining_items: i64,
}

impl PlacementNotice {
    /// 通知主题: {prefix}/{cubby_id}/item
    pub fn topic(&self, prefix: &str) -> String {
        format!("{}/{}/item", prefix, self.cubby_id)
    }

    /// 通知载荷（结构化 JSON 文本）
    pub fn payload(&self) -> NoticePayload {
        NoticePayload {
            status: "ASSIGNED",
            color: self.color.name(),
            remaining_items: self.remaining_items,
        }
    }
}

/// 通知载荷结构
///
/// 指示灯端按此结构解析: {"status":"ASSIGNED","color":"red","remaining_items":1}
#[derive(Debug, Clone, Serialize)]
pub struct NoticePayload {
    pub status: &'static str,
    pub color: &'static str,
    pub remaining_items: i64,
}

// ==========================================
// 通知发布 Trait
// ==========================================

/// 亮灯通知发布者 Trait
///
/// Engine 层定义，notify 层实现
///
/// # 实现说明
/// - `notify::QueuedNotifier` 将通知入队，由后台任务推送到指示灯通道
/// - publish 必须立即返回，不得等待通道确认
pub trait PlacementNotifier: Send + Sync {
    /// 发布亮灯通知
    ///
    /// # 返回
    /// - `Ok(())`: 已接受（入队成功，不代表已送达）
    /// - `Err`: 发布失败（调用方只记日志）
    fn publish(&self, notice: PlacementNotice) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 空操作通知发布者
///
/// 用于不需要亮灯的场景（如单元测试）
#[derive(Debug, Clone, Default)]
pub struct NoOpNotifier;

impl PlacementNotifier for NoOpNotifier {
    fn publish(&self, notice: PlacementNotice) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpNotifier: 跳过亮灯通知 - cubby_id={}, color={}",
            notice.cubby_id,
            notice.color
        );
        Ok(())
    }
}

/// 可选的通知发布者包装
///
/// 简化 Option<Arc<dyn PlacementNotifier>> 的使用，
/// 并统一“失败只记日志”的吞错语义
pub struct OptionalNotifier {
    inner: Option<Arc<dyn PlacementNotifier>>,
}

impl OptionalNotifier {
    /// 创建带发布者的实例
    pub fn with_notifier(notifier: Arc<dyn PlacementNotifier>) -> Self {
        Self {
            inner: Some(notifier),
        }
    }

    /// 创建空实例（不发布通知）
    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发布通知（如果有发布者）；失败记 warn 并吞掉
    pub fn publish_best_effort(&self, notice: PlacementNotice) {
        match &self.inner {
            Some(notifier) => {
                if let Err(e) = notifier.publish(notice.clone()) {
                    tracing::warn!(
                        "亮灯通知发布失败（已忽略）: cubby_id={}, error={}",
                        notice.cubby_id,
                        e
                    );
                }
            }
            None => {
                tracing::debug!(
                    "OptionalNotifier: 未配置发布者，跳过通知 - cubby_id={}",
                    notice.cubby_id
                );
            }
        }
    }

    /// 检查是否配置了发布者
    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalNotifier {
    fn default() -> Self {
        Self::none()
    }
}
