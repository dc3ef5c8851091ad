//! 发帖类规则（徽章 1、2）

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use super::{Eligibility, EligibilityRule};
use crate::error::Result;
use crate::models::BadgeKind;
use crate::repository::{GroupRepositoryTrait, PostRepositoryTrait};

/// 近期连续发帖规则
///
/// 统计 `[now - window_days, now]` 内创建的帖子
pub struct ConsecutivePostsRule {
    group_repo: Arc<dyn GroupRepositoryTrait>,
    post_repo: Arc<dyn PostRepositoryTrait>,
    window_days: i64,
    required: i64,
}

impl ConsecutivePostsRule {
    pub fn new(
        group_repo: Arc<dyn GroupRepositoryTrait>,
        post_repo: Arc<dyn PostRepositoryTrait>,
        window_days: i64,
        required: i64,
    ) -> Self {
        Self {
            group_repo,
            post_repo,
            window_days,
            required,
        }
    }
}

#[async_trait]
impl EligibilityRule for ConsecutivePostsRule {
    fn badge(&self) -> BadgeKind {
        BadgeKind::ConsecutivePosts
    }

    async fn evaluate(&self, group_id: i64, now: DateTime<Utc>) -> Result<Eligibility> {
        if self.group_repo.get_group(group_id).await?.is_none() {
            return Ok(Eligibility::SubjectNotFound);
        }

        let since = now - Duration::days(self.window_days);
        let recent = self.post_repo.count_posts(group_id, Some(since)).await?;

        Ok(if recent >= self.required {
            Eligibility::Eligible { group_id }
        } else {
            Eligibility::NotEligible
        })
    }
}

/// 累计发帖规则
pub struct MinPostsRule {
    group_repo: Arc<dyn GroupRepositoryTrait>,
    post_repo: Arc<dyn PostRepositoryTrait>,
    required: i64,
}

impl MinPostsRule {
    pub fn new(
        group_repo: Arc<dyn GroupRepositoryTrait>,
        post_repo: Arc<dyn PostRepositoryTrait>,
        required: i64,
    ) -> Self {
        Self {
            group_repo,
            post_repo,
            required,
        }
    }
}

#[async_trait]
impl EligibilityRule for MinPostsRule {
    fn badge(&self) -> BadgeKind {
        BadgeKind::MinPosts
    }

    async fn evaluate(&self, group_id: i64, _now: DateTime<Utc>) -> Result<Eligibility> {
        if self.group_repo.get_group(group_id).await?.is_none() {
            return Ok(Eligibility::SubjectNotFound);
        }

        // 以帖子表为准，不依赖可能滞后的 post_count
        let total = self.post_repo.count_posts(group_id, None).await?;

        Ok(if total >= self.required {
            Eligibility::Eligible { group_id }
        } else {
            Eligibility::NotEligible
        })
    }
}
