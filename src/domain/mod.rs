// ==========================================
// 播种墙扫码分拣系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、业务规则接口
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod cubby;
pub mod order;
pub mod product;
pub mod scan_log;
pub mod types;

// 重导出核心类型
pub use cubby::Cubby;
pub use order::{Order, OrderItem};
pub use product::Product;
pub use scan_log::ScanLog;
pub use types::{IndicatorColor, OrderPhase, ScanOutcome, PALETTE_SIZE};
