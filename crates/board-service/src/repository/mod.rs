//! 数据仓储层
//!
//! 提供所有实体的数据访问接口，封装 SQL 操作细节。
//!
//! ## 设计原则
//!
//! - 仓储只负责数据持久化，不包含业务逻辑
//! - 计数器更新均为单条语句内的原子操作
//! - 徽章授予的幂等性由唯一约束保证
//! - 定义 trait 接口以支持 mock 测试和进程内存储

mod badge_repo;
mod comment_repo;
mod group_repo;
mod memory;
mod post_repo;
mod traits;

pub use badge_repo::{BadgeRepository, GroupBadgeRepository};
pub use comment_repo::CommentRepository;
pub use group_repo::GroupRepository;
pub use memory::MemoryBoardStore;
pub use post_repo::PostRepository;
pub use traits::*;
