// ==========================================
// 播种墙扫码分拣系统 - 指示灯通道端口
// ==========================================
// 说明: 真实部署里这是消息代理的会话（按格口号分主题），
// 代理连接管理在系统边界之外；进程内提供日志通道与
// 内存通道两个适配器
// ==========================================

use async_trait::async_trait;
use std::error::Error;
use std::sync::Mutex;

/// 指示灯通道 Trait
///
/// 外部代理客户端实现此 trait 即可接入；
/// send 的耗时由上层 QueuedNotifier 统一加超时
#[async_trait]
pub trait IndicatorChannel: Send + Sync {
    /// 向指定主题发送一条载荷
    async fn send(&self, topic: &str, payload: String)
        -> Result<(), Box<dyn Error + Send + Sync>>;
}

// ==========================================
// LoggingIndicatorChannel - 日志通道
// ==========================================

/// 日志通道（开发/未接代理时的默认实现）
///
/// 只把通知打进日志，便于联调看到亮灯指令
#[derive(Debug, Clone, Default)]
pub struct LoggingIndicatorChannel;

#[async_trait]
impl IndicatorChannel for LoggingIndicatorChannel {
    async fn send(
        &self,
        topic: &str,
        payload: String,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::info!("亮灯通知: topic={}, payload={}", topic, payload);
        Ok(())
    }
}

// ==========================================
// InMemoryIndicatorChannel - 内存通道
// ==========================================

/// 内存通道（测试用）
///
/// 把发出的 (topic, payload) 原样存下来供断言
#[derive(Debug, Default)]
pub struct InMemoryIndicatorChannel {
    messages: Mutex<Vec<(String, String)>>,
}

impl InMemoryIndicatorChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已发送消息快照
    pub fn messages(&self) -> Vec<(String, String)> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl IndicatorChannel for InMemoryIndicatorChannel {
    async fn send(
        &self,
        topic: &str,
        payload: String,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.messages
            .lock()
            .map_err(|e| -> Box<dyn Error + Send + Sync> {
                format!("内存通道锁获取失败: {}", e).into()
            })?
            .push((topic.to_string(), payload));
        Ok(())
    }
}
