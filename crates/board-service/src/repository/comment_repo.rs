//! 评论仓储

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::CommentRepositoryTrait;
use crate::error::{BoardError, Result};
use crate::models::{Comment, NewComment};

/// 评论仓储
pub struct CommentRepository {
    pool: PgPool,
}

impl CommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_comment(&self, id: i64) -> Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, post_id, nickname, content, password_hash, created_at
            FROM comments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    /// 按创建时间正序分页列出帖子评论
    pub async fn list_by_post(&self, post_id: i64, limit: i64, offset: i64) -> Result<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, post_id, nickname, content, password_hash, created_at
            FROM comments
            WHERE post_id = $1
            ORDER BY created_at ASC, id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(post_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    /// 插入评论并自增帖子 comment_count，同一事务内完成
    pub async fn create_comment(&self, comment: &NewComment) -> Result<Comment> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (post_id, nickname, content, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, post_id, nickname, content, password_hash, created_at
            "#,
        )
        .bind(comment.post_id)
        .bind(&comment.nickname)
        .bind(&comment.content)
        .bind(&comment.password_hash)
        .bind(comment.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                BoardError::PostNotFound(comment.post_id)
            }
            e => e.into(),
        })?;

        sqlx::query("UPDATE posts SET comment_count = comment_count + 1 WHERE id = $1")
            .bind(comment.post_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(created)
    }

    pub async fn update_comment(
        &self,
        id: i64,
        nickname: Option<String>,
        content: Option<String>,
    ) -> Result<Option<Comment>> {
        let updated = sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comments
            SET nickname = COALESCE($2, nickname),
                content = COALESCE($3, content)
            WHERE id = $1
            RETURNING id, post_id, nickname, content, password_hash, created_at
            "#,
        )
        .bind(id)
        .bind(nickname)
        .bind(content)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    /// 删除评论并自减帖子 comment_count
    pub async fn delete_comment(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let post_id =
            sqlx::query_scalar::<_, i64>("DELETE FROM comments WHERE id = $1 RETURNING post_id")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(post_id) = post_id else {
            return Ok(false);
        };
        sqlx::query(
            "UPDATE posts SET comment_count = GREATEST(comment_count - 1, 0) WHERE id = $1",
        )
        .bind(post_id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(true)
    }
}

#[async_trait]
impl CommentRepositoryTrait for CommentRepository {
    async fn get_comment(&self, id: i64) -> Result<Option<Comment>> {
        self.get_comment(id).await
    }

    async fn create_comment(&self, comment: &NewComment) -> Result<Comment> {
        self.create_comment(comment).await
    }

    async fn update_comment(
        &self,
        id: i64,
        nickname: Option<String>,
        content: Option<String>,
    ) -> Result<Option<Comment>> {
        self.update_comment(id, nickname, content).await
    }

    async fn delete_comment(&self, id: i64) -> Result<bool> {
        self.delete_comment(id).await
    }

    async fn list_by_post(&self, post_id: i64, limit: i64, offset: i64) -> Result<Vec<Comment>> {
        self.list_by_post(post_id, limit, offset).await
    }
}
