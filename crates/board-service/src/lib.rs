//! 社区看板徽章服务
//!
//! 群组与帖子的计数（发帖数、点赞数、创建时长）达到里程碑时，
//! 自动为群组授予徽章，并维护群组的 badge_count。
//!
//! ## 核心功能
//!
//! - **资格规则**：五条只读判定规则，每条对应一个徽章
//! - **授予账本**：(群组, 徽章) 至多授予一次，并发安全
//! - **徽章引擎**：按领域事件评估规则、写入账本、重算 badge_count
//! - **CRUD 服务**：群组、帖子、评论的增删改查与点赞
//! - **满周年扫描**：后台 Worker 定期评估满周年徽章
//!
//! ## 模块结构
//!
//! - `models`: 领域模型定义
//! - `error`: 错误类型定义
//! - `schema`: 静态实体注册表
//! - `repository`: 仓储接口、PostgreSQL 实现与进程内存储
//! - `rules`: 资格规则
//! - `ledger`: 授予账本
//! - `engine`: 徽章引擎
//! - `service`: 业务服务层
//! - `worker`: 后台 Worker

pub mod engine;
pub mod error;
pub mod ledger;
pub mod models;
pub mod password;
pub mod repository;
pub mod rules;
pub mod schema;
pub mod service;
pub mod worker;

pub use engine::{BadgeEngine, EvaluationReport, Trigger};
pub use error::{BoardError, Result};
pub use ledger::{AwardLedger, AwardOutcome};
pub use models::*;
pub use repository::{
    BadgeRepository, CommentRepository, GroupBadgeRepository, GroupRepository, MemoryBoardStore,
    PostRepository,
};
pub use rules::{Eligibility, EligibilityRule, RuleSet};
pub use service::{CommentService, GroupService, PostService, dto};
pub use worker::{SweepSummary, TenureSweepWorker};
