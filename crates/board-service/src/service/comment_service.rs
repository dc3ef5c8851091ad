//! 评论服务
//!
//! 评论增删同步维护帖子的 comment_count

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use validator::Validate;

use super::dto::{CreateCommentRequest, PageRequest, UpdateCommentRequest};
use crate::error::{BoardError, Result};
use crate::models::{Comment, NewComment};
use crate::password::{DEFAULT_HASH_COST, ensure_password, hash_password};
use crate::repository::{CommentRepositoryTrait, PostRepositoryTrait};

/// 评论服务
pub struct CommentService {
    post_repo: Arc<dyn PostRepositoryTrait>,
    comment_repo: Arc<dyn CommentRepositoryTrait>,
    hash_cost: u32,
}

impl CommentService {
    pub fn new(
        post_repo: Arc<dyn PostRepositoryTrait>,
        comment_repo: Arc<dyn CommentRepositoryTrait>,
    ) -> Self {
        Self {
            post_repo,
            comment_repo,
            hash_cost: DEFAULT_HASH_COST,
        }
    }

    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    #[instrument(skip(self, request))]
    pub async fn add_comment(&self, post_id: i64, request: CreateCommentRequest) -> Result<Comment> {
        request.validate()?;

        if self.post_repo.get_post(post_id).await?.is_none() {
            return Err(BoardError::PostNotFound(post_id));
        }

        let new_comment = NewComment {
            post_id,
            nickname: request.nickname,
            content: request.content,
            password_hash: hash_password(&request.password, self.hash_cost)?,
            created_at: Utc::now(),
        };
        let comment = self.comment_repo.create_comment(&new_comment).await?;

        info!(post_id, comment_id = comment.id, "评论创建成功");
        Ok(comment)
    }

    pub async fn list_comments(&self, post_id: i64, page: PageRequest) -> Result<Vec<Comment>> {
        page.validate()?;
        if self.post_repo.get_post(post_id).await?.is_none() {
            return Err(BoardError::PostNotFound(post_id));
        }

        self.comment_repo
            .list_by_post(post_id, page.page_size, page.offset())
            .await
    }

    #[instrument(skip(self, request))]
    pub async fn update_comment(
        &self,
        comment_id: i64,
        request: UpdateCommentRequest,
    ) -> Result<Comment> {
        request.validate()?;

        let comment = self.find_comment(comment_id).await?;
        ensure_password(&request.password, &comment.password_hash)?;

        if request.nickname.is_none() && request.content.is_none() {
            return Ok(comment);
        }

        self.comment_repo
            .update_comment(comment_id, request.nickname, request.content)
            .await?
            .ok_or(BoardError::CommentNotFound(comment_id))
    }

    #[instrument(skip(self, password))]
    pub async fn delete_comment(&self, comment_id: i64, password: &str) -> Result<()> {
        let comment = self.find_comment(comment_id).await?;
        ensure_password(password, &comment.password_hash)?;

        if !self.comment_repo.delete_comment(comment_id).await? {
            return Err(BoardError::CommentNotFound(comment_id));
        }

        info!(comment_id, post_id = comment.post_id, "评论已删除");
        Ok(())
    }

    async fn find_comment(&self, comment_id: i64) -> Result<Comment> {
        self.comment_repo
            .get_comment(comment_id)
            .await?
            .ok_or(BoardError::CommentNotFound(comment_id))
    }
}
