// ==========================================
// 播种墙扫码分拣系统 - 引擎层
// ==========================================
// 职责: 实现分拣业务规则（分配/进度/通知契约）
// 红线: 引擎不拼 SQL；共享状态变更全部经由仓储的
// 条件更新接口
// ==========================================

pub mod allocator;
pub mod events;
pub mod progress;

// 重导出核心引擎
pub use allocator::{CubbyAllocator, DEFAULT_CLAIM_RETRY_LIMIT};
pub use events::{
    NoOpNotifier, NoticePayload, OptionalNotifier, PlacementNotice, PlacementNotifier,
    DEFAULT_TOPIC_PREFIX,
};
pub use progress::OrderProgressTracker;
