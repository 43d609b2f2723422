// ==========================================
// 播种墙扫码分拣系统 - 队列化亮灯发布者
// ==========================================
// 形态: 有界 mpsc 队列 + 单个后台推送任务
// publish = try_send，立即返回；序列化、发送、
// 超时全部发生在后台任务里
// ==========================================

use crate::engine::events::{PlacementNotice, PlacementNotifier};
use crate::notify::channel::IndicatorChannel;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// 通知发布配置
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// 主题前缀（完整主题: {prefix}/{cubby_id}/item）
    pub topic_prefix: String,
    /// 单条通知的通道发送超时（毫秒）
    pub publish_timeout_ms: u64,
    /// 队列容量（队满丢弃并记日志）
    pub queue_capacity: usize,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            topic_prefix: crate::engine::events::DEFAULT_TOPIC_PREFIX.to_string(),
            publish_timeout_ms: 1_000,
            queue_capacity: 256,
        }
    }
}

// ==========================================
// QueuedNotifier - 队列化发布者
// ==========================================
pub struct QueuedNotifier {
    tx: mpsc::Sender<PlacementNotice>,
}

impl QueuedNotifier {
    /// 启动后台推送任务并返回发布者
    ///
    /// 任务在所有发布者句柄释放后自然退出；
    /// 返回的 JoinHandle 供进程收尾时等待队列清空
    pub fn spawn(
        channel: Arc<dyn IndicatorChannel>,
        config: NotifierConfig,
    ) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<PlacementNotice>(config.queue_capacity);
        let timeout = Duration::from_millis(config.publish_timeout_ms);
        let prefix = config.topic_prefix.clone();

        let handle = tokio::spawn(async move {
            while let Some(notice) = rx.recv().await {
                let topic = notice.topic(&prefix);
                let payload = match serde_json::to_string(&notice.payload()) {
                    Ok(p) => p,
                    Err(e) => {
                        warn!("通知序列化失败（已忽略）: topic={}, error={}", topic, e);
                        continue;
                    }
                };

                match tokio::time::timeout(timeout, channel.send(&topic, payload)).await {
                    Ok(Ok(())) => {
                        debug!("亮灯通知已送出: topic={}", topic);
                    }
                    Ok(Err(e)) => {
                        warn!("通道发送失败（已忽略）: topic={}, error={}", topic, e);
                    }
                    Err(_) => {
                        warn!(
                            "通道发送超时（已忽略）: topic={}, timeout_ms={}",
                            topic,
                            timeout.as_millis()
                        );
                    }
                }
            }
            debug!("亮灯推送任务退出（队列已关闭）");
        });

        (Self { tx }, handle)
    }
}

impl PlacementNotifier for QueuedNotifier {
    /// 入队即返回；队满或队列已关闭返回 Err（调用方只记日志）
    fn publish(&self, notice: PlacementNotice) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.tx
            .try_send(notice)
            .map_err(|e| -> Box<dyn Error + Send + Sync> {
                format!("通知入队失败: {}", e).into()
            })
    }
}
