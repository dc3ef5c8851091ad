//! 徽章目录与授予账本仓储
//!
//! 账本的幂等性完全依赖 `(group_id, badge_id)` 唯一约束：
//! 并发插入同一对时只有一条语句影响行数为 1。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::traits::{BadgeRepositoryTrait, GroupBadgeRepositoryTrait};
use crate::error::{BoardError, Result};
use crate::models::{Badge, GroupBadgeDetail};

/// 徽章目录仓储（只读）
pub struct BadgeRepository {
    pool: PgPool,
}

impl BadgeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_badge(&self, id: i64) -> Result<Option<Badge>> {
        let badge = sqlx::query_as::<_, Badge>("SELECT id, name FROM badges WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(badge)
    }

    pub async fn list_badges(&self) -> Result<Vec<Badge>> {
        let badges = sqlx::query_as::<_, Badge>("SELECT id, name FROM badges ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(badges)
    }
}

#[async_trait]
impl BadgeRepositoryTrait for BadgeRepository {
    async fn get_badge(&self, id: i64) -> Result<Option<Badge>> {
        self.get_badge(id).await
    }

    async fn list_badges(&self) -> Result<Vec<Badge>> {
        self.list_badges().await
    }
}

/// 群组徽章账本仓储
pub struct GroupBadgeRepository {
    pool: PgPool,
}

impl GroupBadgeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ==================== 查询操作 ====================

    pub async fn exists(&self, group_id: i64, badge_id: i64) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM group_badges WHERE group_id = $1 AND badge_id = $2)",
        )
        .bind(group_id)
        .bind(badge_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    pub async fn count_by_group(&self, group_id: i64) -> Result<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM group_badges WHERE group_id = $1")
                .bind(group_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    pub async fn list_by_group(&self, group_id: i64) -> Result<Vec<GroupBadgeDetail>> {
        let badges = sqlx::query_as::<_, GroupBadgeDetail>(
            r#"
            SELECT gb.badge_id, b.name, gb.awarded_at
            FROM group_badges gb
            JOIN badges b ON b.id = gb.badge_id
            WHERE gb.group_id = $1
            ORDER BY gb.badge_id
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(badges)
    }

    // ==================== 写入操作 ====================

    pub async fn insert_if_absent(
        &self,
        group_id: i64,
        badge_id: i64,
        awarded_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO group_badges (group_id, badge_id, awarded_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (group_id, badge_id) DO NOTHING
            "#,
        )
        .bind(group_id)
        .bind(badge_id)
        .bind(awarded_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(result) => Ok(result.rows_affected() == 1),
            // 群组在评估与写入之间被删除
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                Err(BoardError::GroupNotFound(group_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 重算 badge_count
    ///
    /// 先锁定群组行，再在新语句中统计账本，统计快照晚于锁的获取，
    /// 并发重算时后提交者一定能看到先提交的账本记录
    pub async fn sync_badge_count(&self, group_id: i64) -> Result<Option<i64>> {
        let mut tx = self.pool.begin().await?;

        let locked =
            sqlx::query_scalar::<_, i64>("SELECT id FROM groups WHERE id = $1 FOR UPDATE")
                .bind(group_id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Ok(None);
        }

        let count = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE groups
            SET badge_count = (SELECT COUNT(*) FROM group_badges WHERE group_id = $1)
            WHERE id = $1
            RETURNING badge_count
            "#,
        )
        .bind(group_id)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(count)
    }
}

#[async_trait]
impl GroupBadgeRepositoryTrait for GroupBadgeRepository {
    async fn exists(&self, group_id: i64, badge_id: i64) -> Result<bool> {
        self.exists(group_id, badge_id).await
    }

    async fn insert_if_absent(
        &self,
        group_id: i64,
        badge_id: i64,
        awarded_at: DateTime<Utc>,
    ) -> Result<bool> {
        self.insert_if_absent(group_id, badge_id, awarded_at).await
    }

    async fn count_by_group(&self, group_id: i64) -> Result<i64> {
        self.count_by_group(group_id).await
    }

    async fn sync_badge_count(&self, group_id: i64) -> Result<Option<i64>> {
        self.sync_badge_count(group_id).await
    }

    async fn list_by_group(&self, group_id: i64) -> Result<Vec<GroupBadgeDetail>> {
        self.list_by_group(group_id).await
    }
}
