// ==========================================
// 播种墙扫码分拣系统 - 商品领域模型
// ==========================================
// 商品目录为只读参照数据，本核心只查不改
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Product - 商品主数据
// ==========================================
// 对齐: product 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub sku: String,  // 商品条码（主键）
    pub name: String, // 商品展示名

    // ===== 审计字段 =====
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}
