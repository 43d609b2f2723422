// ==========================================
// 播种墙扫码分拣系统 - 格口分配引擎
// ==========================================
// 职责: 格口的占用/互斥/确认/释放
// 红线: 占用必须走条件更新；候选失效在引擎内
// 有界重试消化，不外泄为错误
// ==========================================

use crate::repository::cubby_repo::CubbyRepository;
use crate::repository::error::RepositoryResult;
use std::sync::Arc;
use tracing::{debug, warn};

/// 占用重试次数默认值
pub const DEFAULT_CLAIM_RETRY_LIMIT: i64 = 3;

// ==========================================
// CubbyAllocator - 格口分配引擎
// ==========================================
pub struct CubbyAllocator {
    cubby_repo: Arc<CubbyRepository>,
    claim_retry_limit: i64,
}

impl CubbyAllocator {
    /// 构造函数
    ///
    /// # 参数
    /// - cubby_repo: 格口仓储
    /// - claim_retry_limit: 候选失效后的重选次数上限
    pub fn new(cubby_repo: Arc<CubbyRepository>, claim_retry_limit: i64) -> Self {
        Self {
            cubby_repo,
            claim_retry_limit: claim_retry_limit.max(1),
        }
    }

    /// 占用一个格口
    ///
    /// 规则：
    /// 1) 候选取当前最小号空闲格口
    /// 2) 条件更新 occupied 0->1；0 行说明候选被并发请求抢走
    /// 3) 抢失败不报错，重选下一候选，最多 claim_retry_limit 轮
    ///
    /// # 返回
    /// - Ok(Some(cubby_id)): 占用成功
    /// - Ok(None): 无可用格口（候选耗尽或重试上限用完）
    pub fn claim(&self) -> RepositoryResult<Option<i64>> {
        for attempt in 0..self.claim_retry_limit {
            let candidate = match self.cubby_repo.find_lowest_free()? {
                Some(id) => id,
                None => {
                    debug!("无空闲格口候选, attempt={}", attempt);
                    return Ok(None);
                }
            };

            if self.cubby_repo.try_claim(candidate)? {
                debug!("格口占用成功: cubby_id={}, attempt={}", candidate, attempt);
                return Ok(Some(candidate));
            }

            // 候选被抢，换下一个最小号空闲格口再试
            debug!("格口候选失效: cubby_id={}, attempt={}", candidate, attempt);
        }

        warn!(
            "格口占用重试耗尽: retry_limit={}",
            self.claim_retry_limit
        );
        Ok(None)
    }

    /// 置投料中（互斥闸门）
    ///
    /// 透传仓储的条件更新结果；冲突即“放置待确认”
    pub fn mark_in_progress(&self, cubby_id: i64) -> RepositoryResult<()> {
        self.cubby_repo.mark_in_progress(cubby_id)
    }

    /// 放置确认（幂等）
    pub fn confirm_placement(&self, cubby_id: i64) -> RepositoryResult<()> {
        self.cubby_repo.confirm_placement(cubby_id)
    }

    /// 释放格口
    ///
    /// 用途: 首扫竞争落败的回收、完单释放策略
    pub fn release(&self, cubby_id: i64) -> RepositoryResult<()> {
        self.cubby_repo.release(cubby_id)
    }
}
