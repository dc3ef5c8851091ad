//! 群组服务
//!
//! 群组的增删改查、密码校验、点赞，以及群组徽章查询。
//! 点赞成功后触发群组获赞徽章评估，评估结果不影响点赞本身。

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use validator::Validate;

use super::dto::{CreateGroupRequest, UpdateGroupRequest};
use crate::engine::{BadgeEngine, Trigger};
use crate::error::{BoardError, Result};
use crate::models::{Group, GroupBadgeDetail, GroupChanges, NewGroup};
use crate::password::{DEFAULT_HASH_COST, ensure_password, hash_password, verify_password};
use crate::repository::GroupRepositoryTrait;

/// 群组服务
pub struct GroupService {
    group_repo: Arc<dyn GroupRepositoryTrait>,
    engine: Arc<BadgeEngine>,
    hash_cost: u32,
}

impl GroupService {
    pub fn new(group_repo: Arc<dyn GroupRepositoryTrait>, engine: Arc<BadgeEngine>) -> Self {
        Self {
            group_repo,
            engine,
            hash_cost: DEFAULT_HASH_COST,
        }
    }

    /// 设置 bcrypt 成本
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_group(&self, request: CreateGroupRequest) -> Result<Group> {
        request.validate()?;

        let new_group = NewGroup {
            name: request.name,
            image_url: request.image_url,
            introduction: request.introduction,
            is_public: request.is_public,
            password_hash: hash_password(&request.password, self.hash_cost)?,
            created_at: Utc::now(),
        };
        let group = self.group_repo.create_group(&new_group).await?;

        info!(group_id = group.id, "群组创建成功");
        Ok(group)
    }

    pub async fn get_group(&self, group_id: i64) -> Result<Group> {
        self.group_repo
            .get_group(group_id)
            .await?
            .ok_or(BoardError::GroupNotFound(group_id))
    }

    #[instrument(skip(self, request))]
    pub async fn update_group(&self, group_id: i64, request: UpdateGroupRequest) -> Result<Group> {
        request.validate()?;

        let group = self.get_group(group_id).await?;
        ensure_password(&request.password, &group.password_hash)?;

        let password_hash = match &request.new_password {
            Some(p) => Some(hash_password(p, self.hash_cost)?),
            None => None,
        };
        let changes = GroupChanges {
            name: request.name,
            image_url: request.image_url,
            introduction: request.introduction,
            is_public: request.is_public,
            password_hash,
        };
        if changes.is_empty() {
            return Ok(group);
        }

        self.group_repo
            .update_group(group_id, &changes)
            .await?
            .ok_or(BoardError::GroupNotFound(group_id))
    }

    /// 删除群组，帖子、评论与徽章记录随之级联删除
    #[instrument(skip(self, password))]
    pub async fn delete_group(&self, group_id: i64, password: &str) -> Result<()> {
        let group = self.get_group(group_id).await?;
        ensure_password(password, &group.password_hash)?;

        if !self.group_repo.delete_group(group_id).await? {
            return Err(BoardError::GroupNotFound(group_id));
        }

        info!(group_id, "群组已删除");
        Ok(())
    }

    pub async fn verify_group_password(&self, group_id: i64, password: &str) -> Result<bool> {
        let group = self.get_group(group_id).await?;
        verify_password(password, &group.password_hash)
    }

    /// 点赞群组，返回点赞后的群组
    #[instrument(skip(self))]
    pub async fn like_group(&self, group_id: i64) -> Result<Group> {
        let group = self
            .group_repo
            .increment_like_count(group_id)
            .await?
            .ok_or(BoardError::GroupNotFound(group_id))?;

        self.engine.dispatch(Trigger::GroupLiked, group_id).await;
        Ok(group)
    }

    /// 群组已获得的徽章
    pub async fn group_badges(&self, group_id: i64) -> Result<Vec<GroupBadgeDetail>> {
        self.get_group(group_id).await?;
        self.engine.ledger().badges_of(group_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::AwardLedger;
    use crate::repository::{MockGroupBadgeRepositoryTrait, MockGroupRepositoryTrait};
    use crate::rules::RuleSet;
    use board_shared::config::BadgeConfig;
    use board_shared::retry::RetryPolicy;

    fn stored_group(password: &str) -> Group {
        Group {
            id: 1,
            name: "g".to_string(),
            image_url: None,
            introduction: String::new(),
            is_public: true,
            password_hash: hash_password(password, 4).unwrap(),
            like_count: 0,
            badge_count: 0,
            post_count: 0,
            created_at: Utc::now(),
        }
    }

    fn service(repo: MockGroupRepositoryTrait) -> GroupService {
        let repo: Arc<dyn GroupRepositoryTrait> = Arc::new(repo);
        let engine = BadgeEngine::new(
            RuleSet::from_rules(vec![]),
            AwardLedger::new(Arc::new(MockGroupBadgeRepositoryTrait::new())),
            &BadgeConfig::default(),
        )
        .with_retry_policy(RetryPolicy::none());
        GroupService::new(repo, Arc::new(engine)).with_hash_cost(4)
    }

    #[tokio::test]
    async fn test_create_group_rejects_invalid_request() {
        let mut repo = MockGroupRepositoryTrait::new();
        repo.expect_create_group().never();

        let request = CreateGroupRequest {
            name: String::new(),
            image_url: None,
            introduction: String::new(),
            is_public: true,
            password: "secret".to_string(),
        };
        let err = service(repo).create_group(request).await.unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_create_group_hashes_password() {
        let mut repo = MockGroupRepositoryTrait::new();
        repo.expect_create_group().returning(|g| {
            assert_ne!(g.password_hash, "secret");
            assert!(bcrypt::verify("secret", &g.password_hash).unwrap());
            let mut group = stored_group("secret");
            group.name = g.name.clone();
            Ok(group)
        });

        let request = CreateGroupRequest {
            name: "hikers".to_string(),
            image_url: None,
            introduction: String::new(),
            is_public: true,
            password: "secret".to_string(),
        };
        let group = service(repo).create_group(request).await.unwrap();
        assert_eq!(group.name, "hikers");
    }

    #[tokio::test]
    async fn test_delete_group_requires_password() {
        let mut repo = MockGroupRepositoryTrait::new();
        repo.expect_get_group()
            .returning(|_| Ok(Some(stored_group("secret"))));
        repo.expect_delete_group().never();

        let err = service(repo).delete_group(1, "wrong").await.unwrap_err();
        assert!(matches!(err, BoardError::PasswordMismatch));
    }

    #[tokio::test]
    async fn test_update_without_changes_returns_current() {
        let mut repo = MockGroupRepositoryTrait::new();
        repo.expect_get_group()
            .returning(|_| Ok(Some(stored_group("secret"))));
        repo.expect_update_group().never();

        let request = UpdateGroupRequest {
            password: "secret".to_string(),
            ..Default::default()
        };
        let group = service(repo).update_group(1, request).await.unwrap();
        assert_eq!(group.id, 1);
    }

    #[tokio::test]
    async fn test_like_missing_group() {
        let mut repo = MockGroupRepositoryTrait::new();
        repo.expect_increment_like_count().returning(|_| Ok(None));

        let err = service(repo).like_group(9).await.unwrap_err();
        assert!(matches!(err, BoardError::GroupNotFound(9)));
    }
}
