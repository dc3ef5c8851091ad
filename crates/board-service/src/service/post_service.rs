//! 帖子服务
//!
//! 发帖与点赞是徽章评估的两个主要触发点：
//! 发帖后评估徽章 1、2，帖子点赞后评估徽章 5。

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument};
use validator::Validate;

use super::dto::{CreatePostRequest, PageRequest, PostDetail, UpdatePostRequest};
use crate::engine::{BadgeEngine, Trigger};
use crate::error::{BoardError, Result};
use crate::models::{NewPost, Post, PostChanges, normalize_tags};
use crate::password::{DEFAULT_HASH_COST, ensure_password, hash_password};
use crate::repository::{GroupRepositoryTrait, PostRepositoryTrait};

/// 帖子服务
pub struct PostService {
    group_repo: Arc<dyn GroupRepositoryTrait>,
    post_repo: Arc<dyn PostRepositoryTrait>,
    engine: Arc<BadgeEngine>,
    hash_cost: u32,
}

impl PostService {
    pub fn new(
        group_repo: Arc<dyn GroupRepositoryTrait>,
        post_repo: Arc<dyn PostRepositoryTrait>,
        engine: Arc<BadgeEngine>,
    ) -> Self {
        Self {
            group_repo,
            post_repo,
            engine,
            hash_cost: DEFAULT_HASH_COST,
        }
    }

    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    /// 在群组下发帖
    ///
    /// 私密群组必须提供正确的群组密码
    #[instrument(skip(self, request))]
    pub async fn create_post(&self, group_id: i64, request: CreatePostRequest) -> Result<PostDetail> {
        request.validate()?;

        let group = self
            .group_repo
            .get_group(group_id)
            .await?
            .ok_or(BoardError::GroupNotFound(group_id))?;
        if !group.is_public {
            let password = request.group_password.as_deref().unwrap_or_default();
            ensure_password(password, &group.password_hash)?;
        }

        let new_post = NewPost {
            group_id,
            nickname: request.nickname,
            title: request.title,
            content: request.content,
            image_url: request.image_url,
            location: request.location,
            moment: request.moment,
            password_hash: hash_password(&request.post_password, self.hash_cost)?,
            is_public: request.is_public,
            tags: normalize_tags(&request.tags),
            created_at: Utc::now(),
        };
        // 帖子、标签与 post_count 由仓储一次写入
        let post = self.post_repo.create_post(&new_post).await?;
        info!(group_id, post_id = post.id, "帖子创建成功");

        self.engine.dispatch(Trigger::PostCreated, group_id).await;

        Ok(PostDetail::with_tag_names(post, new_post.tags))
    }

    pub async fn get_post(&self, post_id: i64) -> Result<PostDetail> {
        let post = self.find_post(post_id).await?;
        let tags = self.post_repo.list_tags(post_id).await?;
        Ok(PostDetail::new(post, tags))
    }

    #[instrument(skip(self, request))]
    pub async fn update_post(&self, post_id: i64, request: UpdatePostRequest) -> Result<PostDetail> {
        request.validate()?;

        let post = self.find_post(post_id).await?;
        ensure_password(&request.post_password, &post.post_password)?;

        let changes = PostChanges {
            nickname: request.nickname,
            title: request.title,
            content: request.content,
            image_url: request.image_url,
            location: request.location,
            moment: request.moment,
            is_public: request.is_public,
            tags: request.tags.as_deref().map(normalize_tags),
        };
        let updated = self
            .post_repo
            .update_post(post_id, &changes)
            .await?
            .ok_or(BoardError::PostNotFound(post_id))?;

        let tags = self.post_repo.list_tags(post_id).await?;
        Ok(PostDetail::new(updated, tags))
    }

    /// 删除帖子，已获得的徽章不会撤销
    #[instrument(skip(self, password))]
    pub async fn delete_post(&self, post_id: i64, password: &str) -> Result<()> {
        let post = self.find_post(post_id).await?;
        ensure_password(password, &post.post_password)?;

        if self.post_repo.delete_post(post_id).await?.is_none() {
            return Err(BoardError::PostNotFound(post_id));
        }

        info!(post_id, group_id = post.group_id, "帖子已删除");
        Ok(())
    }

    /// 点赞帖子，返回点赞后的帖子
    #[instrument(skip(self))]
    pub async fn like_post(&self, post_id: i64) -> Result<Post> {
        let post = self
            .post_repo
            .increment_like_count(post_id)
            .await?
            .ok_or(BoardError::PostNotFound(post_id))?;
        debug!(post_id, like_count = post.like_count, "帖子点赞");

        self.engine.dispatch(Trigger::PostLiked, post_id).await;
        Ok(post)
    }

    pub async fn list_posts_by_group(&self, group_id: i64, page: PageRequest) -> Result<Vec<Post>> {
        page.validate()?;
        if self.group_repo.get_group(group_id).await?.is_none() {
            return Err(BoardError::GroupNotFound(group_id));
        }

        self.post_repo
            .list_by_group(group_id, page.page_size, page.offset())
            .await
    }

    async fn find_post(&self, post_id: i64) -> Result<Post> {
        self.post_repo
            .get_post(post_id)
            .await?
            .ok_or(BoardError::PostNotFound(post_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::AwardLedger;
    use crate::models::Group;
    use crate::repository::{
        MockGroupBadgeRepositoryTrait, MockGroupRepositoryTrait, MockPostRepositoryTrait,
    };
    use crate::rules::RuleSet;
    use board_shared::config::BadgeConfig;
    use board_shared::retry::RetryPolicy;
    use mockall::predicate::eq;

    fn private_group() -> Group {
        Group {
            id: 1,
            name: "secret club".to_string(),
            image_url: None,
            introduction: String::new(),
            is_public: false,
            password_hash: hash_password("group-secret", 4).unwrap(),
            like_count: 0,
            badge_count: 0,
            post_count: 0,
            created_at: Utc::now(),
        }
    }

    fn stored_post(password: &str) -> Post {
        Post {
            id: 10,
            group_id: 1,
            nickname: "n".to_string(),
            title: "t".to_string(),
            content: "c".to_string(),
            image_url: None,
            location: None,
            moment: None,
            post_password: hash_password(password, 4).unwrap(),
            is_public: true,
            like_count: 0,
            comment_count: 0,
            created_at: Utc::now(),
        }
    }

    fn request(group_password: Option<&str>) -> CreatePostRequest {
        CreatePostRequest {
            nickname: "hana".to_string(),
            title: "sunrise".to_string(),
            content: "summit".to_string(),
            image_url: None,
            location: None,
            moment: None,
            post_password: "post-secret".to_string(),
            group_password: group_password.map(str::to_string),
            is_public: true,
            tags: vec![],
        }
    }

    fn service(groups: MockGroupRepositoryTrait, posts: MockPostRepositoryTrait) -> PostService {
        let engine = BadgeEngine::new(
            RuleSet::from_rules(vec![]),
            AwardLedger::new(Arc::new(MockGroupBadgeRepositoryTrait::new())),
            &BadgeConfig::default(),
        )
        .with_retry_policy(RetryPolicy::none());
        PostService::new(Arc::new(groups), Arc::new(posts), Arc::new(engine)).with_hash_cost(4)
    }

    #[tokio::test]
    async fn test_create_post_in_missing_group() {
        let mut groups = MockGroupRepositoryTrait::new();
        groups.expect_get_group().returning(|_| Ok(None));
        let mut posts = MockPostRepositoryTrait::new();
        posts.expect_create_post().never();

        let err = service(groups, posts)
            .create_post(7, request(None))
            .await
            .unwrap_err();
        assert!(matches!(err, BoardError::GroupNotFound(7)));
    }

    #[tokio::test]
    async fn test_private_group_rejects_wrong_password() {
        let mut groups = MockGroupRepositoryTrait::new();
        groups.expect_get_group().returning(|_| Ok(Some(private_group())));
        let mut posts = MockPostRepositoryTrait::new();
        posts.expect_create_post().never();

        let err = service(groups, posts)
            .create_post(1, request(Some("guess")))
            .await
            .unwrap_err();
        assert!(matches!(err, BoardError::PasswordMismatch));
    }

    #[tokio::test]
    async fn test_delete_post_checks_password() {
        let groups = MockGroupRepositoryTrait::new();
        let mut posts = MockPostRepositoryTrait::new();
        posts
            .expect_get_post()
            .returning(|_| Ok(Some(stored_post("post-secret"))));
        posts
            .expect_delete_post()
            .with(eq(10_i64))
            .times(1)
            .returning(|_| Ok(Some(stored_post("post-secret"))));

        let service = service(groups, posts);
        let err = service.delete_post(10, "wrong").await.unwrap_err();
        assert!(matches!(err, BoardError::PasswordMismatch));
        service.delete_post(10, "post-secret").await.unwrap();
    }

    #[tokio::test]
    async fn test_create_post_does_not_reread_tags() {
        let mut groups = MockGroupRepositoryTrait::new();
        groups.expect_get_group().returning(|_| {
            let mut group = private_group();
            group.is_public = true;
            Ok(Some(group))
        });
        let mut posts = MockPostRepositoryTrait::new();
        posts
            .expect_create_post()
            .times(1)
            .returning(|_| Ok(stored_post("post-secret")));
        posts.expect_list_tags().never();

        let mut request = request(None);
        request.tags = vec!["trail".to_string(), " dawn ".to_string(), "trail".to_string()];
        let detail = service(groups, posts).create_post(1, request).await.unwrap();
        assert_eq!(detail.tags, vec!["dawn", "trail"]);
    }

    #[tokio::test]
    async fn test_like_missing_post() {
        let groups = MockGroupRepositoryTrait::new();
        let mut posts = MockPostRepositoryTrait::new();
        posts.expect_increment_like_count().returning(|_| Ok(None));

        let err = service(groups, posts).like_post(3).await.unwrap_err();
        assert!(matches!(err, BoardError::PostNotFound(3)));
    }
}
