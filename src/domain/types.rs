// ==========================================
// 播种墙扫码分拣系统 - 领域类型定义
// ==========================================
// 亮灯颜色为纯展示值，不落库、不参与任何业务判定
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 亮灯颜色 (Indicator Color)
// ==========================================
// 固定 6 色调色板，扫码响应携带下标，亮灯通知携带颜色名
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorColor {
    Red,
    Green,
    Blue,
    Yellow,
    Purple,
    Orange,
}

/// 调色板大小
pub const PALETTE_SIZE: usize = 6;

impl IndicatorColor {
    /// 调色板全集（下标即 colorIndex）
    pub const PALETTE: [IndicatorColor; PALETTE_SIZE] = [
        IndicatorColor::Red,
        IndicatorColor::Green,
        IndicatorColor::Blue,
        IndicatorColor::Yellow,
        IndicatorColor::Purple,
        IndicatorColor::Orange,
    ];

    /// 按下标取颜色
    pub fn from_index(index: usize) -> Option<IndicatorColor> {
        Self::PALETTE.get(index).copied()
    }

    /// 颜色在调色板中的下标
    pub fn index(&self) -> usize {
        Self::PALETTE
            .iter()
            .position(|c| c == self)
            .unwrap_or(0)
    }

    /// 颜色名（通知载荷用，小写）
    pub fn name(&self) -> &'static str {
        match self {
            IndicatorColor::Red => "red",
            IndicatorColor::Green => "green",
            IndicatorColor::Blue => "blue",
            IndicatorColor::Yellow => "yellow",
            IndicatorColor::Purple => "purple",
            IndicatorColor::Orange => "orange",
        }
    }

    /// 从调色板中均匀随机选取一色
    pub fn pick_random() -> IndicatorColor {
        use rand::Rng;
        let idx = rand::rng().random_range(0..PALETTE_SIZE);
        Self::PALETTE[idx]
    }
}

impl fmt::Display for IndicatorColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ==========================================
// 订单扫码阶段 (Order Phase)
// ==========================================
// 由 Order.cubby_id / remaining_items / Cubby.in_progress 派生，
// 不单独落库，仅用于流程判定与日志
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderPhase {
    NoCubby,         // 未分配格口
    CubbyIdle,       // 已分配，空闲可投
    CubbyInProgress, // 已分配，放置待确认
    Complete,        // 全部扫完
}

impl fmt::Display for OrderPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderPhase::NoCubby => write!(f, "NO_CUBBY"),
            OrderPhase::CubbyIdle => write!(f, "CUBBY_IDLE"),
            OrderPhase::CubbyInProgress => write!(f, "CUBBY_IN_PROGRESS"),
            OrderPhase::Complete => write!(f, "COMPLETE"),
        }
    }
}

// ==========================================
// 扫码结果 (Scan Outcome)
// ==========================================
// 写入 scan_log.outcome 的枚举全集
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanOutcome {
    Assigned,         // 扫码成功，已亮灯
    ProductNotFound,  // SKU 不在商品目录
    OrderNotFound,    // 指定订单不存在
    NoPendingOrder,   // 无待分拣订单可匹配
    NoCubbyAvailable, // 无可用格口
    CubbyBusy,        // 格口放置待确认，拒绝投料
    DuplicateScan,    // 重复扫码
    ItemNotFound,     // 订单中无此明细
    InternalError,    // 其他内部错误
}

impl ScanOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanOutcome::Assigned => "ASSIGNED",
            ScanOutcome::ProductNotFound => "PRODUCT_NOT_FOUND",
            ScanOutcome::OrderNotFound => "ORDER_NOT_FOUND",
            ScanOutcome::NoPendingOrder => "NO_PENDING_ORDER",
            ScanOutcome::NoCubbyAvailable => "NO_CUBBY_AVAILABLE",
            ScanOutcome::CubbyBusy => "CUBBY_BUSY",
            ScanOutcome::DuplicateScan => "DUPLICATE_SCAN",
            ScanOutcome::ItemNotFound => "ITEM_NOT_FOUND",
            ScanOutcome::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ScanOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
