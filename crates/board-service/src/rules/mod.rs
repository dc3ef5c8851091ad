//! 徽章资格规则
//!
//! 每种徽章对应一条规则。规则只读取当前状态并给出判定，从不修改数据；
//! 当前时刻由调用方传入，便于在测试中精确控制边界。
//!
//! | 徽章 | 主体 | 条件 |
//! |------|------|------|
//! | 1 | 群组 | 最近 N 天内发帖数达到阈值 |
//! | 2 | 群组 | 累计发帖数达到阈值 |
//! | 3 | 群组 | 创建满 N 个月 |
//! | 4 | 群组 | 群组获赞数达到阈值 |
//! | 5 | 帖子 | 帖子获赞数达到阈值，授予帖子所属群组 |

mod likes;
mod posting;
mod tenure;

use std::sync::Arc;

use async_trait::async_trait;
use board_shared::config::BadgeConfig;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::BadgeKind;
use crate::repository::{GroupRepositoryTrait, PostRepositoryTrait};

pub use likes::{GroupLikesRule, PostLikesRule};
pub use posting::{ConsecutivePostsRule, MinPostsRule};
pub use tenure::GroupAgeRule;

/// 规则判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    /// 满足条件，徽章应授予该群组
    Eligible { group_id: i64 },
    NotEligible,
    /// 主体已不存在（并发删除等），视为不满足
    SubjectNotFound,
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible { .. })
    }

    /// 指标标签
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eligible { .. } => "eligible",
            Self::NotEligible => "not_eligible",
            Self::SubjectNotFound => "subject_not_found",
        }
    }
}

/// 资格规则接口
#[async_trait]
pub trait EligibilityRule: Send + Sync {
    /// 规则对应的徽章
    fn badge(&self) -> BadgeKind;

    /// 判定主体在 `now` 时刻是否满足条件
    ///
    /// 主体为群组 id，帖子点赞规则为帖子 id
    async fn evaluate(&self, subject_id: i64, now: DateTime<Utc>) -> Result<Eligibility>;
}

/// 全部规则的集合，按徽章种类索引
#[derive(Clone)]
pub struct RuleSet {
    rules: Vec<Arc<dyn EligibilityRule>>,
}

impl RuleSet {
    /// 按配置构建五条规则
    pub fn from_config(
        config: &BadgeConfig,
        group_repo: Arc<dyn GroupRepositoryTrait>,
        post_repo: Arc<dyn PostRepositoryTrait>,
    ) -> Self {
        let rules: Vec<Arc<dyn EligibilityRule>> = vec![
            Arc::new(ConsecutivePostsRule::new(
                group_repo.clone(),
                post_repo.clone(),
                config.consecutive_post_window_days,
                config.consecutive_post_count,
            )),
            Arc::new(MinPostsRule::new(
                group_repo.clone(),
                post_repo.clone(),
                config.min_post_count,
            )),
            Arc::new(GroupAgeRule::new(group_repo.clone(), config.group_age_months)),
            Arc::new(GroupLikesRule::new(group_repo, config.group_like_threshold)),
            Arc::new(PostLikesRule::new(post_repo, config.post_like_threshold)),
        ];
        Self { rules }
    }

    /// 使用自定义规则构建（测试或扩展用），同一徽章后注册者覆盖先注册者
    pub fn from_rules(rules: Vec<Arc<dyn EligibilityRule>>) -> Self {
        Self { rules }
    }

    pub fn get(&self, kind: BadgeKind) -> Option<Arc<dyn EligibilityRule>> {
        self.rules.iter().rev().find(|r| r.badge() == kind).cloned()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
