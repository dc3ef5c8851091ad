//! 群组仓储
//!
//! 群组的 CRUD 与计数器更新，计数器均为单条语句内的原子更新

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::traits::GroupRepositoryTrait;
use crate::error::Result;
use crate::models::{Group, GroupChanges, NewGroup};

const GROUP_COLUMNS: &str = "id, name, image_url, introduction, is_public, password_hash, \
     like_count, badge_count, post_count, created_at";

/// 群组仓储
pub struct GroupRepository {
    pool: PgPool,
}

impl GroupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ==================== 查询操作 ====================

    pub async fn get_group(&self, id: i64) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(&format!(
            "SELECT {GROUP_COLUMNS} FROM groups WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    /// 满一年徽章的候选群组
    ///
    /// 已持有该徽章的群组被排除，结果按创建时间升序
    pub async fn list_tenure_candidates(
        &self,
        cutoff: DateTime<Utc>,
        badge_id: i64,
        limit: i64,
    ) -> Result<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT g.id
            FROM groups g
            WHERE g.created_at <= $1
              AND NOT EXISTS (
                  SELECT 1 FROM group_badges gb
                  WHERE gb.group_id = g.id AND gb.badge_id = $2
              )
            ORDER BY g.created_at ASC, g.id ASC
            LIMIT $3
            "#,
        )
        .bind(cutoff)
        .bind(badge_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    // ==================== 写入操作 ====================

    pub async fn create_group(&self, group: &NewGroup) -> Result<Group> {
        let created = sqlx::query_as::<_, Group>(&format!(
            r#"
            INSERT INTO groups (name, image_url, introduction, is_public, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {GROUP_COLUMNS}
            "#
        ))
        .bind(&group.name)
        .bind(&group.image_url)
        .bind(&group.introduction)
        .bind(group.is_public)
        .bind(&group.password_hash)
        .bind(group.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// 部分更新，COALESCE 保留未提供的字段
    pub async fn update_group(&self, id: i64, changes: &GroupChanges) -> Result<Option<Group>> {
        let updated = sqlx::query_as::<_, Group>(&format!(
            r#"
            UPDATE groups
            SET name = COALESCE($2, name),
                image_url = COALESCE($3, image_url),
                introduction = COALESCE($4, introduction),
                is_public = COALESCE($5, is_public),
                password_hash = COALESCE($6, password_hash)
            WHERE id = $1
            RETURNING {GROUP_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.image_url)
        .bind(&changes.introduction)
        .bind(changes.is_public)
        .bind(&changes.password_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    /// 删除群组，帖子、评论与账本记录由外键级联删除
    pub async fn delete_group(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // ==================== 计数器 ====================

    pub async fn increment_like_count(&self, id: i64) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(&format!(
            "UPDATE groups SET like_count = like_count + 1 WHERE id = $1 RETURNING {GROUP_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }
}

#[async_trait]
impl GroupRepositoryTrait for GroupRepository {
    async fn get_group(&self, id: i64) -> Result<Option<Group>> {
        self.get_group(id).await
    }

    async fn create_group(&self, group: &NewGroup) -> Result<Group> {
        self.create_group(group).await
    }

    async fn update_group(&self, id: i64, changes: &GroupChanges) -> Result<Option<Group>> {
        self.update_group(id, changes).await
    }

    async fn delete_group(&self, id: i64) -> Result<bool> {
        self.delete_group(id).await
    }

    async fn increment_like_count(&self, id: i64) -> Result<Option<Group>> {
        self.increment_like_count(id).await
    }

    async fn list_tenure_candidates(
        &self,
        cutoff: DateTime<Utc>,
        badge_id: i64,
        limit: i64,
    ) -> Result<Vec<i64>> {
        self.list_tenure_candidates(cutoff, badge_id, limit).await
    }
}
