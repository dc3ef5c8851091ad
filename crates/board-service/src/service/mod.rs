//! 业务服务层
//!
//! 对仓储的薄封装，面向调用方的错误只从这一层产生。
//! 计数变化后分发徽章评估，评估失败不影响业务操作本身。

mod comment_service;
pub mod dto;
mod group_service;
mod post_service;

pub use comment_service::CommentService;
pub use group_service::GroupService;
pub use post_service::PostService;
