// ==========================================
// 播种墙扫码分拣系统 - 通知适配层
// ==========================================
// 职责: 把引擎层的亮灯通知契约落到具体通道上
// 形态: 有界队列 + 后台推送任务 + 通道超时
// 红线: publish 不阻塞扫码线程；队满/通道故障
// 只记日志，扫码结果照常返回
// ==========================================

pub mod channel;
pub mod queued;

pub use channel::{IndicatorChannel, InMemoryIndicatorChannel, LoggingIndicatorChannel};
pub use queued::{NotifierConfig, QueuedNotifier};
