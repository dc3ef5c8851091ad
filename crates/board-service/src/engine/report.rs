//! 评估触发源与评估报告

use serde::Serialize;

use crate::models::BadgeKind;

/// 触发徽章评估的领域事件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// 新帖子创建，主体为群组
    PostCreated,
    /// 帖子被点赞，主体为帖子
    PostLiked,
    /// 群组被点赞，主体为群组
    GroupLiked,
    /// 周期性满周年检查，主体为群组
    TenureCheck,
}

impl Trigger {
    /// 该事件需要评估的徽章
    pub fn badges(self) -> &'static [BadgeKind] {
        match self {
            Self::PostCreated => &[BadgeKind::ConsecutivePosts, BadgeKind::MinPosts],
            Self::PostLiked => &[BadgeKind::PostLikes],
            Self::GroupLiked => &[BadgeKind::GroupLikes],
            Self::TenureCheck => &[BadgeKind::GroupAge],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PostCreated => "post_created",
            Self::PostLiked => "post_liked",
            Self::GroupLiked => "group_liked",
            Self::TenureCheck => "tenure_check",
        }
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单次评估的结果汇总
///
/// 调用方可以忽略；引擎内部错误只体现在 `skipped` 中，不会向上传播
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationReport {
    pub trigger: Trigger,
    pub subject_id: i64,
    /// 实际受益的群组（帖子点赞时为帖子所属群组）
    pub group_id: Option<i64>,
    pub awarded: Vec<BadgeKind>,
    pub already_held: Vec<BadgeKind>,
    pub not_eligible: Vec<BadgeKind>,
    /// 重试耗尽后放弃的徽章
    pub skipped: Vec<BadgeKind>,
    /// 新授予后同步的 badge_count
    pub badge_count: Option<i64>,
    /// badge_count 同步失败
    pub count_sync_failed: bool,
}

impl EvaluationReport {
    pub fn new(trigger: Trigger, subject_id: i64) -> Self {
        Self {
            trigger,
            subject_id,
            group_id: None,
            awarded: Vec::new(),
            already_held: Vec::new(),
            not_eligible: Vec::new(),
            skipped: Vec::new(),
            badge_count: None,
            count_sync_failed: false,
        }
    }

    pub fn has_new_awards(&self) -> bool {
        !self.awarded.is_empty()
    }

    /// 没有任何徽章被放弃
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty() && !self.count_sync_failed
    }
}
