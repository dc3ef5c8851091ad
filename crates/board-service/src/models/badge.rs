//! 徽章目录与授予记录

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 徽章目录项（只读参考数据，id 固定为 1..=5）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub id: i64,
    pub name: String,
}

/// 徽章种类
///
/// 与目录 id 一一对应，每种徽章对应一条资格规则
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BadgeKind {
    /// 近 7 天内发帖达到 7 篇
    ConsecutivePosts,
    /// 累计发帖达到 20 篇
    MinPosts,
    /// 群组创建满一年
    GroupAge,
    /// 群组获赞达到阈值
    GroupLikes,
    /// 单帖获赞达到阈值
    PostLikes,
}

impl BadgeKind {
    pub const ALL: [BadgeKind; 5] = [
        BadgeKind::ConsecutivePosts,
        BadgeKind::MinPosts,
        BadgeKind::GroupAge,
        BadgeKind::GroupLikes,
        BadgeKind::PostLikes,
    ];

    /// 目录中的徽章 id
    pub fn id(self) -> i64 {
        match self {
            Self::ConsecutivePosts => 1,
            Self::MinPosts => 2,
            Self::GroupAge => 3,
            Self::GroupLikes => 4,
            Self::PostLikes => 5,
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.id() == id)
    }

    /// 目录初始名称（与 schema 中的种子数据一致）
    pub fn catalog_name(self) -> &'static str {
        match self {
            Self::ConsecutivePosts => "7 posts in 7 days",
            Self::MinPosts => "20 posts",
            Self::GroupAge => "1 year anniversary",
            Self::GroupLikes => "Group likes milestone",
            Self::PostLikes => "Post likes milestone",
        }
    }

    /// 指标与日志中使用的短名
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConsecutivePosts => "consecutive_posts",
            Self::MinPosts => "min_posts",
            Self::GroupAge => "group_age",
            Self::GroupLikes => "group_likes",
            Self::PostLikes => "post_likes",
        }
    }
}

impl std::fmt::Display for BadgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 授予账本记录
///
/// (group_id, badge_id) 唯一，存在即表示群组已获得该徽章
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GroupBadge {
    pub group_id: i64,
    pub badge_id: i64,
    pub awarded_at: DateTime<Utc>,
}

/// 群组徽章详情（账本记录关联目录名称）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GroupBadgeDetail {
    pub badge_id: i64,
    pub name: String,
    pub awarded_at: DateTime<Utc>,
}
