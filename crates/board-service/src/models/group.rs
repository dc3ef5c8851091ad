//! 群组实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 群组
///
/// 计数字段由 CRUD 层和徽章引擎维护，与底层数据最终一致
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: i64,
    pub name: String,
    #[sqlx(default)]
    pub image_url: Option<String>,
    pub introduction: String,
    pub is_public: bool,
    /// bcrypt 哈希，不对外输出
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub like_count: i64,
    /// 持有徽章数，始终由账本重新计算得出
    pub badge_count: i64,
    pub post_count: i64,
    pub created_at: DateTime<Utc>,
}

impl Group {
    /// 群组创建至今的时长
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.created_at
    }
}

/// 新建群组所需字段
#[derive(Debug, Clone)]
pub struct NewGroup {
    pub name: String,
    pub image_url: Option<String>,
    pub introduction: String,
    pub is_public: bool,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// 群组可更新字段，None 表示不修改
#[derive(Debug, Clone, Default)]
pub struct GroupChanges {
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub introduction: Option<String>,
    pub is_public: Option<bool>,
    pub password_hash: Option<String>,
}

impl GroupChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.image_url.is_none()
            && self.introduction.is_none()
            && self.is_public.is_none()
            && self.password_hash.is_none()
    }

    /// 将变更应用到内存中的群组
    pub fn apply_to(&self, group: &mut Group) {
        if let Some(name) = &self.name {
            group.name = name.clone();
        }
        if let Some(url) = &self.image_url {
            group.image_url = Some(url.clone());
        }
        if let Some(intro) = &self.introduction {
            group.introduction = intro.clone();
        }
        if let Some(is_public) = self.is_public {
            group.is_public = is_public;
        }
        if let Some(hash) = &self.password_hash {
            group.password_hash = hash.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_group() -> Group {
        Group {
            id: 1,
            name: "hikers".to_string(),
            image_url: None,
            introduction: "weekend trails".to_string(),
            is_public: true,
            password_hash: "hash".to_string(),
            like_count: 0,
            badge_count: 0,
            post_count: 0,
            created_at: Utc::now() - Duration::days(3),
        }
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let json = serde_json::to_value(sample_group()).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["likeCount"], 0);
    }

    #[test]
    fn test_apply_changes() {
        let mut group = sample_group();
        let changes = GroupChanges {
            name: Some("climbers".to_string()),
            is_public: Some(false),
            ..Default::default()
        };
        assert!(!changes.is_empty());
        changes.apply_to(&mut group);
        assert_eq!(group.name, "climbers");
        assert!(!group.is_public);
        assert_eq!(group.introduction, "weekend trails");
        assert!(GroupChanges::default().is_empty());
    }

    #[test]
    fn test_age() {
        let group = sample_group();
        let now = group.created_at + Duration::days(10);
        assert_eq!(group.age(now), Duration::days(10));
    }
}
