//! 点赞类规则（徽章 4、5）

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{Eligibility, EligibilityRule};
use crate::error::Result;
use crate::models::BadgeKind;
use crate::repository::{GroupRepositoryTrait, PostRepositoryTrait};

/// 群组获赞规则
pub struct GroupLikesRule {
    group_repo: Arc<dyn GroupRepositoryTrait>,
    threshold: i64,
}

impl GroupLikesRule {
    pub fn new(group_repo: Arc<dyn GroupRepositoryTrait>, threshold: i64) -> Self {
        Self {
            group_repo,
            threshold,
        }
    }
}

#[async_trait]
impl EligibilityRule for GroupLikesRule {
    fn badge(&self) -> BadgeKind {
        BadgeKind::GroupLikes
    }

    async fn evaluate(&self, group_id: i64, _now: DateTime<Utc>) -> Result<Eligibility> {
        let Some(group) = self.group_repo.get_group(group_id).await? else {
            return Ok(Eligibility::SubjectNotFound);
        };

        Ok(if group.like_count >= self.threshold {
            Eligibility::Eligible { group_id }
        } else {
            Eligibility::NotEligible
        })
    }
}

/// 单帖获赞规则
///
/// 主体为帖子，徽章授予帖子所属的群组
pub struct PostLikesRule {
    post_repo: Arc<dyn PostRepositoryTrait>,
    threshold: i64,
}

impl PostLikesRule {
    pub fn new(post_repo: Arc<dyn PostRepositoryTrait>, threshold: i64) -> Self {
        Self {
            post_repo,
            threshold,
        }
    }
}

#[async_trait]
impl EligibilityRule for PostLikesRule {
    fn badge(&self) -> BadgeKind {
        BadgeKind::PostLikes
    }

    async fn evaluate(&self, post_id: i64, _now: DateTime<Utc>) -> Result<Eligibility> {
        let Some(post) = self.post_repo.get_post(post_id).await? else {
            return Ok(Eligibility::SubjectNotFound);
        };

        Ok(if post.like_count >= self.threshold {
            Eligibility::Eligible {
                group_id: post.group_id,
            }
        } else {
            Eligibility::NotEligible
        })
    }
}
