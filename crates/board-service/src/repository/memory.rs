//! 进程内存储
//!
//! 实现全部仓储接口，用于测试和本地演示。
//! 每个操作只在同步锁内完成，锁不会跨越 `.await`。

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::traits::{
    BadgeRepositoryTrait, CommentRepositoryTrait, GroupBadgeRepositoryTrait, GroupRepositoryTrait,
    PostRepositoryTrait,
};
use crate::error::{BoardError, Result};
use crate::models::{
    Badge, BadgeKind, Comment, Group, GroupBadge, GroupBadgeDetail, GroupChanges, NewComment,
    NewGroup, NewPost, Post, PostChanges, Tag, normalize_tags,
};

#[derive(Default)]
struct BoardState {
    groups: BTreeMap<i64, Group>,
    posts: BTreeMap<i64, Post>,
    comments: BTreeMap<i64, Comment>,
    tags: BTreeMap<i64, Tag>,
    post_tags: BTreeSet<(i64, i64)>,
    badges: BTreeMap<i64, Badge>,
    group_badges: HashMap<(i64, i64), GroupBadge>,
    next_group_id: i64,
    next_post_id: i64,
    next_comment_id: i64,
    next_tag_id: i64,
}

impl BoardState {
    fn next_id(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }

    fn attach_tags(&mut self, post_id: i64, tags: &[String]) {
        for name in normalize_tags(tags) {
            let existing = self.tags.values().find(|t| t.name == name).map(|t| t.id);
            let tag_id = match existing {
                Some(id) => id,
                None => {
                    let id = Self::next_id(&mut self.next_tag_id);
                    self.tags.insert(id, Tag { id, name });
                    id
                }
            };
            self.post_tags.insert((post_id, tag_id));
        }
    }

    fn remove_post_cascade(&mut self, post_id: i64) {
        self.posts.remove(&post_id);
        self.comments.retain(|_, c| c.post_id != post_id);
        self.post_tags.retain(|(p, _)| *p != post_id);
    }
}

/// 进程内看板存储
pub struct MemoryBoardStore {
    state: RwLock<BoardState>,
    /// 剩余需要注入的失败次数
    pending_failures: AtomicUsize,
}

impl Default for MemoryBoardStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBoardStore {
    /// 创建存储并写入徽章目录
    pub fn new() -> Self {
        let mut state = BoardState::default();
        for kind in BadgeKind::ALL {
            state.badges.insert(
                kind.id(),
                Badge {
                    id: kind.id(),
                    name: kind.catalog_name().to_string(),
                },
            );
        }

        Self {
            state: RwLock::new(state),
            pending_failures: AtomicUsize::new(0),
        }
    }

    /// 让接下来的 `count` 次操作返回 `StoreUnavailable`
    pub fn fail_next(&self, count: usize) {
        self.pending_failures.store(count, Ordering::SeqCst);
    }

    /// 直接写入帖子点赞数
    pub fn set_post_like_count(&self, post_id: i64, like_count: i64) {
        if let Some(post) = self.state.write().posts.get_mut(&post_id) {
            post.like_count = like_count;
        }
    }

    /// 直接写入群组点赞数
    pub fn set_group_like_count(&self, group_id: i64, like_count: i64) {
        if let Some(group) = self.state.write().groups.get_mut(&group_id) {
            group.like_count = like_count;
        }
    }

    fn check_available(&self) -> Result<()> {
        let consumed = self
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match consumed {
            Ok(_) => Err(BoardError::StoreUnavailable("注入的存储故障".to_string())),
            Err(_) => Ok(()),
        }
    }
}

#[async_trait]
impl GroupRepositoryTrait for MemoryBoardStore {
    async fn get_group(&self, id: i64) -> Result<Option<Group>> {
        self.check_available()?;
        Ok(self.state.read().groups.get(&id).cloned())
    }

    async fn create_group(&self, group: &NewGroup) -> Result<Group> {
        self.check_available()?;
        let mut state = self.state.write();
        let id = BoardState::next_id(&mut state.next_group_id);
        let created = Group {
            id,
            name: group.name.clone(),
            image_url: group.image_url.clone(),
            introduction: group.introduction.clone(),
            is_public: group.is_public,
            password_hash: group.password_hash.clone(),
            like_count: 0,
            badge_count: 0,
            post_count: 0,
            created_at: group.created_at,
        };
        state.groups.insert(id, created.clone());
        Ok(created)
    }

    async fn update_group(&self, id: i64, changes: &GroupChanges) -> Result<Option<Group>> {
        self.check_available()?;
        let mut state = self.state.write();
        Ok(state.groups.get_mut(&id).map(|group| {
            changes.apply_to(group);
            group.clone()
        }))
    }

    async fn delete_group(&self, id: i64) -> Result<bool> {
        self.check_available()?;
        let mut state = self.state.write();
        if state.groups.remove(&id).is_none() {
            return Ok(false);
        }
        let post_ids: Vec<i64> = state
            .posts
            .values()
            .filter(|p| p.group_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in post_ids {
            state.remove_post_cascade(post_id);
        }
        state.group_badges.retain(|(g, _), _| *g != id);
        Ok(true)
    }

    async fn increment_like_count(&self, id: i64) -> Result<Option<Group>> {
        self.check_available()?;
        let mut state = self.state.write();
        Ok(state.groups.get_mut(&id).map(|group| {
            group.like_count += 1;
            group.clone()
        }))
    }

    async fn list_tenure_candidates(
        &self,
        cutoff: DateTime<Utc>,
        badge_id: i64,
        limit: i64,
    ) -> Result<Vec<i64>> {
        self.check_available()?;
        let state = self.state.read();
        let mut candidates: Vec<&Group> = state
            .groups
            .values()
            .filter(|g| g.created_at <= cutoff)
            .filter(|g| !state.group_badges.contains_key(&(g.id, badge_id)))
            .collect();
        candidates.sort_by_key(|g| (g.created_at, g.id));
        Ok(candidates
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|g| g.id)
            .collect())
    }
}

#[async_trait]
impl PostRepositoryTrait for MemoryBoardStore {
    async fn get_post(&self, id: i64) -> Result<Option<Post>> {
        self.check_available()?;
        Ok(self.state.read().posts.get(&id).cloned())
    }

    async fn create_post(&self, post: &NewPost) -> Result<Post> {
        self.check_available()?;
        let mut state = self.state.write();
        if !state.groups.contains_key(&post.group_id) {
            return Err(BoardError::GroupNotFound(post.group_id));
        }
        let id = BoardState::next_id(&mut state.next_post_id);
        let created = Post {
            id,
            group_id: post.group_id,
            nickname: post.nickname.clone(),
            title: post.title.clone(),
            content: post.content.clone(),
            image_url: post.image_url.clone(),
            location: post.location.clone(),
            moment: post.moment,
            post_password: post.password_hash.clone(),
            is_public: post.is_public,
            like_count: 0,
            comment_count: 0,
            created_at: post.created_at,
        };
        state.posts.insert(id, created.clone());
        state.attach_tags(id, &post.tags);
        if let Some(group) = state.groups.get_mut(&post.group_id) {
            group.post_count += 1;
        }
        Ok(created)
    }

    async fn update_post(&self, id: i64, changes: &PostChanges) -> Result<Option<Post>> {
        self.check_available()?;
        let mut state = self.state.write();
        let Some(post) = state.posts.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply_to(post);
        let updated = post.clone();
        if let Some(tags) = &changes.tags {
            state.post_tags.retain(|(p, _)| *p != id);
            state.attach_tags(id, tags);
        }
        Ok(Some(updated))
    }

    async fn delete_post(&self, id: i64) -> Result<Option<Post>> {
        self.check_available()?;
        let mut state = self.state.write();
        let Some(post) = state.posts.get(&id).cloned() else {
            return Ok(None);
        };
        state.remove_post_cascade(id);
        if let Some(group) = state.groups.get_mut(&post.group_id) {
            group.post_count = (group.post_count - 1).max(0);
        }
        Ok(Some(post))
    }

    async fn list_by_group(&self, group_id: i64, limit: i64, offset: i64) -> Result<Vec<Post>> {
        self.check_available()?;
        let state = self.state.read();
        let mut posts: Vec<Post> = state
            .posts
            .values()
            .filter(|p| p.group_id == group_id)
            .cloned()
            .collect();
        posts.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(posts
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn list_tags(&self, post_id: i64) -> Result<Vec<Tag>> {
        self.check_available()?;
        let state = self.state.read();
        let mut tags: Vec<Tag> = state
            .post_tags
            .iter()
            .filter(|(p, _)| *p == post_id)
            .filter_map(|(_, t)| state.tags.get(t).cloned())
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn count_posts(&self, group_id: i64, since: Option<DateTime<Utc>>) -> Result<i64> {
        self.check_available()?;
        let state = self.state.read();
        let count = state
            .posts
            .values()
            .filter(|p| p.group_id == group_id)
            .filter(|p| since.is_none_or(|s| p.created_at >= s))
            .count();
        Ok(count as i64)
    }

    async fn increment_like_count(&self, id: i64) -> Result<Option<Post>> {
        self.check_available()?;
        let mut state = self.state.write();
        Ok(state.posts.get_mut(&id).map(|post| {
            post.like_count += 1;
            post.clone()
        }))
    }
}

#[async_trait]
impl CommentRepositoryTrait for MemoryBoardStore {
    async fn get_comment(&self, id: i64) -> Result<Option<Comment>> {
        self.check_available()?;
        Ok(self.state.read().comments.get(&id).cloned())
    }

    async fn create_comment(&self, comment: &NewComment) -> Result<Comment> {
        self.check_available()?;
        let mut state = self.state.write();
        if !state.posts.contains_key(&comment.post_id) {
            return Err(BoardError::PostNotFound(comment.post_id));
        }
        let id = BoardState::next_id(&mut state.next_comment_id);
        let created = Comment {
            id,
            post_id: comment.post_id,
            nickname: comment.nickname.clone(),
            content: comment.content.clone(),
            password_hash: comment.password_hash.clone(),
            created_at: comment.created_at,
        };
        state.comments.insert(id, created.clone());
        if let Some(post) = state.posts.get_mut(&comment.post_id) {
            post.comment_count += 1;
        }
        Ok(created)
    }

    async fn update_comment(
        &self,
        id: i64,
        nickname: Option<String>,
        content: Option<String>,
    ) -> Result<Option<Comment>> {
        self.check_available()?;
        let mut state = self.state.write();
        Ok(state.comments.get_mut(&id).map(|comment| {
            if let Some(nickname) = nickname {
                comment.nickname = nickname;
            }
            if let Some(content) = content {
                comment.content = content;
            }
            comment.clone()
        }))
    }

    async fn delete_comment(&self, id: i64) -> Result<bool> {
        self.check_available()?;
        let mut state = self.state.write();
        let Some(comment) = state.comments.remove(&id) else {
            return Ok(false);
        };
        if let Some(post) = state.posts.get_mut(&comment.post_id) {
            post.comment_count = (post.comment_count - 1).max(0);
        }
        Ok(true)
    }

    async fn list_by_post(&self, post_id: i64, limit: i64, offset: i64) -> Result<Vec<Comment>> {
        self.check_available()?;
        let state = self.state.read();
        Ok(state
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BadgeRepositoryTrait for MemoryBoardStore {
    async fn get_badge(&self, id: i64) -> Result<Option<Badge>> {
        self.check_available()?;
        Ok(self.state.read().badges.get(&id).cloned())
    }

    async fn list_badges(&self) -> Result<Vec<Badge>> {
        self.check_available()?;
        Ok(self.state.read().badges.values().cloned().collect())
    }
}

#[async_trait]
impl GroupBadgeRepositoryTrait for MemoryBoardStore {
    async fn exists(&self, group_id: i64, badge_id: i64) -> Result<bool> {
        self.check_available()?;
        Ok(self
            .state
            .read()
            .group_badges
            .contains_key(&(group_id, badge_id)))
    }

    async fn insert_if_absent(
        &self,
        group_id: i64,
        badge_id: i64,
        awarded_at: DateTime<Utc>,
    ) -> Result<bool> {
        self.check_available()?;
        let mut state = self.state.write();
        // 与外键约束一致：群组或徽章不存在时拒绝写入
        if !state.groups.contains_key(&group_id) {
            return Err(BoardError::GroupNotFound(group_id));
        }
        if !state.badges.contains_key(&badge_id) {
            return Err(BoardError::BadgeNotFound(badge_id));
        }
        if state.group_badges.contains_key(&(group_id, badge_id)) {
            return Ok(false);
        }
        state.group_badges.insert(
            (group_id, badge_id),
            GroupBadge {
                group_id,
                badge_id,
                awarded_at,
            },
        );
        Ok(true)
    }

    async fn count_by_group(&self, group_id: i64) -> Result<i64> {
        self.check_available()?;
        let state = self.state.read();
        Ok(state
            .group_badges
            .keys()
            .filter(|(g, _)| *g == group_id)
            .count() as i64)
    }

    async fn sync_badge_count(&self, group_id: i64) -> Result<Option<i64>> {
        self.check_available()?;
        let mut state = self.state.write();
        let count = state
            .group_badges
            .keys()
            .filter(|(g, _)| *g == group_id)
            .count() as i64;
        Ok(state.groups.get_mut(&group_id).map(|group| {
            group.badge_count = count;
            count
        }))
    }

    async fn list_by_group(&self, group_id: i64) -> Result<Vec<GroupBadgeDetail>> {
        self.check_available()?;
        let state = self.state.read();
        let mut details: Vec<GroupBadgeDetail> = state
            .group_badges
            .values()
            .filter(|gb| gb.group_id == group_id)
            .filter_map(|gb| {
                state.badges.get(&gb.badge_id).map(|b| GroupBadgeDetail {
                    badge_id: gb.badge_id,
                    name: b.name.clone(),
                    awarded_at: gb.awarded_at,
                })
            })
            .collect();
        details.sort_by_key(|d| d.badge_id);
        Ok(details)
    }
}
