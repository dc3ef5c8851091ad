//! 服务层请求与响应 DTO

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Post, Tag};

// ==================== 群组 ====================

/// 创建群组请求
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    #[validate(length(min = 1, max = 100, message = "群组名称长度必须在1-100个字符之间"))]
    pub name: String,
    #[validate(url(message = "图片地址格式不正确"))]
    pub image_url: Option<String>,
    #[validate(length(max = 2000, message = "群组介绍最多2000个字符"))]
    #[serde(default)]
    pub introduction: String,
    #[serde(default = "default_true")]
    pub is_public: bool,
    #[validate(length(min = 4, max = 100, message = "密码长度必须在4-100个字符之间"))]
    pub password: String,
}

/// 更新群组请求，`password` 为当前密码
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGroupRequest {
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "群组名称长度必须在1-100个字符之间"))]
    pub name: Option<String>,
    #[validate(url(message = "图片地址格式不正确"))]
    pub image_url: Option<String>,
    #[validate(length(max = 2000, message = "群组介绍最多2000个字符"))]
    pub introduction: Option<String>,
    pub is_public: Option<bool>,
    #[validate(length(min = 4, max = 100, message = "密码长度必须在4-100个字符之间"))]
    pub new_password: Option<String>,
}

// ==================== 帖子 ====================

/// 创建帖子请求
///
/// 私密群组需要提供 `group_password`
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 50, message = "昵称长度必须在1-50个字符之间"))]
    pub nickname: String,
    #[validate(length(min = 1, max = 200, message = "标题长度必须在1-200个字符之间"))]
    pub title: String,
    #[validate(length(min = 1, message = "内容不能为空"))]
    pub content: String,
    #[validate(url(message = "图片地址格式不正确"))]
    pub image_url: Option<String>,
    #[validate(length(max = 200, message = "地点最多200个字符"))]
    pub location: Option<String>,
    pub moment: Option<DateTime<Utc>>,
    #[validate(length(min = 4, max = 100, message = "密码长度必须在4-100个字符之间"))]
    pub post_password: String,
    pub group_password: Option<String>,
    #[serde(default = "default_true")]
    pub is_public: bool,
    #[validate(length(max = 10, message = "标签最多10个"))]
    #[serde(default)]
    pub tags: Vec<String>,
}

/// 更新帖子请求，`post_password` 为帖子密码
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    pub post_password: String,
    #[validate(length(min = 1, max = 50, message = "昵称长度必须在1-50个字符之间"))]
    pub nickname: Option<String>,
    #[validate(length(min = 1, max = 200, message = "标题长度必须在1-200个字符之间"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "内容不能为空"))]
    pub content: Option<String>,
    #[validate(url(message = "图片地址格式不正确"))]
    pub image_url: Option<String>,
    #[validate(length(max = 200, message = "地点最多200个字符"))]
    pub location: Option<String>,
    pub moment: Option<DateTime<Utc>>,
    pub is_public: Option<bool>,
    #[validate(length(max = 10, message = "标签最多10个"))]
    pub tags: Option<Vec<String>>,
}

/// 帖子详情（含标签名）
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub tags: Vec<String>,
}

impl PostDetail {
    pub fn new(post: Post, tags: Vec<Tag>) -> Self {
        Self {
            post,
            tags: tags.into_iter().map(|t| t.name).collect(),
        }
    }

    /// 由已规范化的标签名构造，按名称排序与 `list_tags` 保持一致
    pub fn with_tag_names(post: Post, mut tags: Vec<String>) -> Self {
        tags.sort();
        Self { post, tags }
    }
}

// ==================== 评论 ====================

/// 创建评论请求
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 50, message = "昵称长度必须在1-50个字符之间"))]
    pub nickname: String,
    #[validate(length(min = 1, max = 1000, message = "评论长度必须在1-1000个字符之间"))]
    pub content: String,
    #[validate(length(min = 4, max = 100, message = "密码长度必须在4-100个字符之间"))]
    pub password: String,
}

/// 更新评论请求
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommentRequest {
    pub password: String,
    #[validate(length(min = 1, max = 50, message = "昵称长度必须在1-50个字符之间"))]
    pub nickname: Option<String>,
    #[validate(length(min = 1, max = 1000, message = "评论长度必须在1-1000个字符之间"))]
    pub content: Option<String>,
}

// ==================== 分页 ====================

/// 分页参数，页码从 1 开始
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    #[validate(range(min = 1, message = "页码必须大于0"))]
    pub page: i64,
    #[validate(range(min = 1, max = 100, message = "每页数量必须在1-100之间"))]
    pub page_size: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
        }
    }
}

impl PageRequest {
    pub fn new(page: i64, page_size: i64) -> Self {
        Self { page, page_size }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}

fn default_true() -> bool {
    true
}
