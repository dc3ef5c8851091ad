//! 徽章授予账本
//!
//! 记录哪些群组持有哪些徽章。同一 (群组, 徽章) 至多一条记录，
//! 一旦授予永久保留；并发授予同一对时恰有一次返回 `Awarded`。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::Result;
use crate::models::{BadgeKind, GroupBadgeDetail};
use crate::repository::GroupBadgeRepositoryTrait;

/// 授予结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AwardOutcome {
    /// 本次调用新写入了账本记录
    Awarded,
    /// 群组此前已持有该徽章
    AlreadyHeld,
}

impl AwardOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Awarded => "awarded",
            Self::AlreadyHeld => "already_held",
        }
    }
}

/// 授予账本
#[derive(Clone)]
pub struct AwardLedger {
    repo: Arc<dyn GroupBadgeRepositoryTrait>,
}

impl AwardLedger {
    pub fn new(repo: Arc<dyn GroupBadgeRepositoryTrait>) -> Self {
        Self { repo }
    }

    pub async fn has_badge(&self, group_id: i64, badge: BadgeKind) -> Result<bool> {
        self.repo.exists(group_id, badge.id()).await
    }

    /// 授予徽章，重复授予返回 `AlreadyHeld` 而非错误
    pub async fn award(
        &self,
        group_id: i64,
        badge: BadgeKind,
        awarded_at: DateTime<Utc>,
    ) -> Result<AwardOutcome> {
        let inserted = self
            .repo
            .insert_if_absent(group_id, badge.id(), awarded_at)
            .await?;

        let outcome = if inserted {
            AwardOutcome::Awarded
        } else {
            AwardOutcome::AlreadyHeld
        };
        debug!(group_id, badge = %badge, outcome = outcome.as_str(), "账本写入完成");
        Ok(outcome)
    }

    /// 以账本记录数重算群组 badge_count
    pub async fn sync_badge_count(&self, group_id: i64) -> Result<Option<i64>> {
        self.repo.sync_badge_count(group_id).await
    }

    /// 群组已获得的徽章（含目录名称）
    pub async fn badges_of(&self, group_id: i64) -> Result<Vec<GroupBadgeDetail>> {
        self.repo.list_by_group(group_id).await
    }
}
