//! 看板领域模型
//!
//! 群组、帖子、评论、标签以及徽章目录与授予账本

pub mod badge;
pub mod group;
pub mod post;

pub use badge::{Badge, BadgeKind, GroupBadge, GroupBadgeDetail};
pub use group::{Group, GroupChanges, NewGroup};
pub use post::{Comment, NewComment, NewPost, Post, PostChanges, Tag, normalize_tags};
