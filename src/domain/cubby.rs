// ==========================================
// 播种墙扫码分拣系统 - 格口领域模型
// ==========================================
// 格口池由外部开墙流程建好（见 seed_demo_db），
// 本核心只翻转 occupied / in_progress 两个标志
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Cubby - 格口
// ==========================================
// 对齐: cubby 表
// 不变量: in_progress=true 必有 occupied=true（表上 CHECK 兜底）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cubby {
    pub cubby_id: i64,     // 格口号（整数，亮灯通道按它定位）
    pub occupied: bool,    // 是否被某订单占用
    pub in_progress: bool, // 放置待确认（已路由一件，工人尚未按灯确认）

    // ===== 审计字段 =====
    pub updated_at: Option<DateTime<Utc>>,
}

impl Cubby {
    /// 可接收新一件投料（占用且无待确认放置）
    pub fn ready_for_item(&self) -> bool {
        self.occupied && !self.in_progress
    }
}
