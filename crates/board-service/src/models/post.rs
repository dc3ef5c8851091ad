//! 帖子、评论与标签实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 帖子
///
/// 属于唯一的群组，群组删除时级联删除
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub group_id: i64,
    pub nickname: String,
    pub title: String,
    pub content: String,
    #[sqlx(default)]
    pub image_url: Option<String>,
    #[sqlx(default)]
    pub location: Option<String>,
    /// 帖子记录的时刻（由作者填写）
    #[sqlx(default)]
    pub moment: Option<DateTime<Utc>>,
    #[serde(skip_serializing, default)]
    pub post_password: String,
    pub is_public: bool,
    pub like_count: i64,
    pub comment_count: i64,
    pub created_at: DateTime<Utc>,
}

/// 新建帖子所需字段
#[derive(Debug, Clone)]
pub struct NewPost {
    pub group_id: i64,
    pub nickname: String,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub location: Option<String>,
    pub moment: Option<DateTime<Utc>>,
    pub password_hash: String,
    pub is_public: bool,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// 帖子可更新字段，None 表示不修改
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub nickname: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub location: Option<String>,
    pub moment: Option<DateTime<Utc>>,
    pub is_public: Option<bool>,
    /// Some 时整体替换标签
    pub tags: Option<Vec<String>>,
}

impl PostChanges {
    /// 将变更应用到内存中的帖子（标签除外）
    pub fn apply_to(&self, post: &mut Post) {
        if let Some(v) = &self.nickname {
            post.nickname = v.clone();
        }
        if let Some(v) = &self.title {
            post.title = v.clone();
        }
        if let Some(v) = &self.content {
            post.content = v.clone();
        }
        if let Some(v) = &self.image_url {
            post.image_url = Some(v.clone());
        }
        if let Some(v) = &self.location {
            post.location = Some(v.clone());
        }
        if let Some(v) = self.moment {
            post.moment = Some(v);
        }
        if let Some(v) = self.is_public {
            post.is_public = v;
        }
    }
}

/// 评论
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub nickname: String,
    pub content: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// 新建评论所需字段
#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: i64,
    pub nickname: String,
    pub content: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// 标签
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// 规范化标签：去空白、去空串、保序去重
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tags.iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.to_string()))
        .map(str::to_string)
        .collect()
}
