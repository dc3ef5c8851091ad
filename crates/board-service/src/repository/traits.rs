//! 仓储 Trait 定义
//!
//! 服务层与徽章引擎只依赖这些接口，PostgreSQL 实现与进程内实现可互换

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{
    Badge, Comment, Group, GroupBadgeDetail, GroupChanges, NewComment, NewGroup, NewPost, Post,
    PostChanges, Tag,
};

/// 群组仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GroupRepositoryTrait: Send + Sync {
    async fn get_group(&self, id: i64) -> Result<Option<Group>>;
    async fn create_group(&self, group: &NewGroup) -> Result<Group>;
    async fn update_group(&self, id: i64, changes: &GroupChanges) -> Result<Option<Group>>;
    async fn delete_group(&self, id: i64) -> Result<bool>;

    // 计数器
    /// 原子自增获赞数，返回更新后的群组
    async fn increment_like_count(&self, id: i64) -> Result<Option<Group>>;

    /// 创建时间不晚于 `cutoff` 且尚未持有 `badge_id` 的群组
    async fn list_tenure_candidates(
        &self,
        cutoff: DateTime<Utc>,
        badge_id: i64,
        limit: i64,
    ) -> Result<Vec<i64>>;
}

/// 帖子仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostRepositoryTrait: Send + Sync {
    async fn get_post(&self, id: i64) -> Result<Option<Post>>;
    /// 创建帖子、关联标签并自增群组 post_count，三者原子完成
    async fn create_post(&self, post: &NewPost) -> Result<Post>;
    async fn update_post(&self, id: i64, changes: &PostChanges) -> Result<Option<Post>>;
    /// 删除帖子并自减群组 post_count，返回被删除的帖子
    async fn delete_post(&self, id: i64) -> Result<Option<Post>>;
    async fn list_by_group(&self, group_id: i64, limit: i64, offset: i64) -> Result<Vec<Post>>;
    async fn list_tags(&self, post_id: i64) -> Result<Vec<Tag>>;

    /// 群组帖子数；`since` 为 Some 时只统计该时刻及之后创建的帖子
    async fn count_posts(&self, group_id: i64, since: Option<DateTime<Utc>>) -> Result<i64>;

    // 计数器
    async fn increment_like_count(&self, id: i64) -> Result<Option<Post>>;
}

/// 评论仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentRepositoryTrait: Send + Sync {
    async fn get_comment(&self, id: i64) -> Result<Option<Comment>>;
    /// 创建评论并自增帖子 comment_count
    async fn create_comment(&self, comment: &NewComment) -> Result<Comment>;
    async fn update_comment(
        &self,
        id: i64,
        nickname: Option<String>,
        content: Option<String>,
    ) -> Result<Option<Comment>>;
    /// 删除评论并自减帖子 comment_count
    async fn delete_comment(&self, id: i64) -> Result<bool>;
    async fn list_by_post(&self, post_id: i64, limit: i64, offset: i64) -> Result<Vec<Comment>>;
}

/// 徽章目录仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BadgeRepositoryTrait: Send + Sync {
    async fn get_badge(&self, id: i64) -> Result<Option<Badge>>;
    async fn list_badges(&self) -> Result<Vec<Badge>>;
}

/// 群组徽章账本仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GroupBadgeRepositoryTrait: Send + Sync {
    async fn exists(&self, group_id: i64, badge_id: i64) -> Result<bool>;

    /// 不存在时插入，返回是否真正插入了新记录
    async fn insert_if_absent(
        &self,
        group_id: i64,
        badge_id: i64,
        awarded_at: DateTime<Utc>,
    ) -> Result<bool>;

    async fn count_by_group(&self, group_id: i64) -> Result<i64>;

    /// 以账本记录数重算并写回群组 badge_count，群组不存在时返回 None
    async fn sync_badge_count(&self, group_id: i64) -> Result<Option<i64>>;

    async fn list_by_group(&self, group_id: i64) -> Result<Vec<GroupBadgeDetail>>;
}
