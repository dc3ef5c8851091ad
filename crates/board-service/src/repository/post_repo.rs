//! 帖子仓储
//!
//! 帖子与标签关联的数据访问。帖子写入、标签关联与群组 post_count 在同一事务内完成。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use super::traits::PostRepositoryTrait;
use crate::error::{BoardError, Result};
use crate::models::{NewPost, Post, PostChanges, Tag, normalize_tags};

const POST_COLUMNS: &str = "id, group_id, nickname, title, content, image_url, location, moment, \
     post_password, is_public, like_count, comment_count, created_at";

/// 帖子仓储
pub struct PostRepository {
    pool: PgPool,
}

impl PostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ==================== 查询操作 ====================

    pub async fn get_post(&self, id: i64) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    /// 按创建时间倒序分页列出群组帖子
    pub async fn list_by_group(&self, group_id: i64, limit: i64, offset: i64) -> Result<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            WHERE group_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(group_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    pub async fn list_tags(&self, post_id: i64) -> Result<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>(
            r#"
            SELECT t.id, t.name
            FROM tags t
            JOIN post_tags pt ON pt.tag_id = t.id
            WHERE pt.post_id = $1
            ORDER BY t.name
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tags)
    }

    pub async fn count_posts(&self, group_id: i64, since: Option<DateTime<Utc>>) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM posts
            WHERE group_id = $1
              AND ($2::timestamptz IS NULL OR created_at >= $2)
            "#,
        )
        .bind(group_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    // ==================== 写入操作 ====================

    /// 插入帖子与标签并自增群组 post_count，同一事务内完成
    pub async fn create_post(&self, post: &NewPost) -> Result<Post> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Post>(&format!(
            r#"
            INSERT INTO posts (group_id, nickname, title, content, image_url, location, moment,
                               post_password, is_public, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(post.group_id)
        .bind(&post.nickname)
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.image_url)
        .bind(&post.location)
        .bind(post.moment)
        .bind(&post.password_hash)
        .bind(post.is_public)
        .bind(post.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            // 群组在校验与写入之间被删除
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                BoardError::GroupNotFound(post.group_id)
            }
            e => e.into(),
        })?;

        Self::attach_tags_in_tx(&mut *tx, created.id, &post.tags).await?;
        sqlx::query("UPDATE groups SET post_count = post_count + 1 WHERE id = $1")
            .bind(post.group_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(created)
    }

    /// 部分更新；`changes.tags` 为 Some 时整体替换标签
    pub async fn update_post(&self, id: i64, changes: &PostChanges) -> Result<Option<Post>> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE posts
            SET nickname = COALESCE($2, nickname),
                title = COALESCE($3, title),
                content = COALESCE($4, content),
                image_url = COALESCE($5, image_url),
                location = COALESCE($6, location),
                moment = COALESCE($7, moment),
                is_public = COALESCE($8, is_public)
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&changes.nickname)
        .bind(&changes.title)
        .bind(&changes.content)
        .bind(&changes.image_url)
        .bind(&changes.location)
        .bind(changes.moment)
        .bind(changes.is_public)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(updated) = updated else {
            return Ok(None);
        };

        if let Some(tags) = &changes.tags {
            sqlx::query("DELETE FROM post_tags WHERE post_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            Self::attach_tags_in_tx(&mut *tx, id, tags).await?;
        }

        tx.commit().await?;
        Ok(Some(updated))
    }

    /// 删除帖子并自减群组 post_count，同一事务内完成
    pub async fn delete_post(&self, id: i64) -> Result<Option<Post>> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query_as::<_, Post>(&format!(
            "DELETE FROM posts WHERE id = $1 RETURNING {POST_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(post) = &deleted {
            sqlx::query("UPDATE groups SET post_count = GREATEST(post_count - 1, 0) WHERE id = $1")
                .bind(post.group_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(deleted)
    }

    // ==================== 计数器 ====================

    pub async fn increment_like_count(&self, id: i64) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "UPDATE posts SET like_count = like_count + 1 WHERE id = $1 RETURNING {POST_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    // ==================== 事务操作 ====================

    /// 按名称 upsert 标签并关联到帖子
    async fn attach_tags_in_tx(conn: &mut PgConnection, post_id: i64, tags: &[String]) -> Result<()> {
        for name in normalize_tags(tags) {
            let tag_id = sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO tags (name) VALUES ($1)
                ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
                RETURNING id
                "#,
            )
            .bind(&name)
            .fetch_one(&mut *conn)
            .await?;

            sqlx::query(
                "INSERT INTO post_tags (post_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(post_id)
            .bind(tag_id)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }
}

#[async_trait]
impl PostRepositoryTrait for PostRepository {
    async fn get_post(&self, id: i64) -> Result<Option<Post>> {
        self.get_post(id).await
    }

    async fn create_post(&self, post: &NewPost) -> Result<Post> {
        self.create_post(post).await
    }

    async fn update_post(&self, id: i64, changes: &PostChanges) -> Result<Option<Post>> {
        self.update_post(id, changes).await
    }

    async fn delete_post(&self, id: i64) -> Result<Option<Post>> {
        self.delete_post(id).await
    }

    async fn list_by_group(&self, group_id: i64, limit: i64, offset: i64) -> Result<Vec<Post>> {
        self.list_by_group(group_id, limit, offset).await
    }

    async fn list_tags(&self, post_id: i64) -> Result<Vec<Tag>> {
        self.list_tags(post_id).await
    }

    async fn count_posts(&self, group_id: i64, since: Option<DateTime<Utc>>) -> Result<i64> {
        self.count_posts(group_id, since).await
    }

    async fn increment_like_count(&self, id: i64) -> Result<Option<Post>> {
        self.increment_like_count(id).await
    }
}
