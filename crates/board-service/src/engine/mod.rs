//! 徽章引擎
//!
//! 每个领域事件对应一个入口：评估相关规则，对满足条件的徽章写入账本，
//! 有新授予时以账本重算群组 badge_count。
//!
//! ## 失败语义
//!
//! - 主体不存在视为不满足条件，仅记录日志
//! - 可重试的存储错误按 `RetryPolicy` 指数退避重试
//! - 重试耗尽后记录 warn 日志，在报告中标记为 skipped
//! - 引擎错误从不传播给触发它的 CRUD 操作

mod report;

use std::sync::Arc;
use std::time::Instant;

use board_shared::config::BadgeConfig;
use board_shared::observability::metrics as board_metrics;
use board_shared::retry::{RetryPolicy, retry_with_policy};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use crate::error::BoardError;
use crate::ledger::{AwardLedger, AwardOutcome};
use crate::models::BadgeKind;
use crate::rules::{Eligibility, RuleSet};

pub use report::{EvaluationReport, Trigger};

/// 单个徽章的评估结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BadgeResult {
    Awarded { group_id: i64 },
    AlreadyHeld { group_id: i64 },
    NotEligible,
    SubjectNotFound,
    Skipped,
}

/// 徽章引擎
pub struct BadgeEngine {
    rules: RuleSet,
    ledger: AwardLedger,
    retry_policy: RetryPolicy,
    async_execution: bool,
}

impl BadgeEngine {
    pub fn new(rules: RuleSet, ledger: AwardLedger, config: &BadgeConfig) -> Self {
        Self {
            rules,
            ledger,
            retry_policy: config.retry_policy(),
            async_execution: config.async_execution,
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn ledger(&self) -> &AwardLedger {
        &self.ledger
    }

    pub fn is_async(&self) -> bool {
        self.async_execution
    }

    // ==================== 事件入口 ====================

    /// 新帖子创建后评估发帖类徽章（1、2）
    pub async fn on_post_created(&self, group_id: i64) -> EvaluationReport {
        self.evaluate(Trigger::PostCreated, group_id, Utc::now()).await
    }

    /// 帖子被点赞后评估单帖获赞徽章（5）
    pub async fn on_post_liked(&self, post_id: i64) -> EvaluationReport {
        self.evaluate(Trigger::PostLiked, post_id, Utc::now()).await
    }

    /// 群组被点赞后评估群组获赞徽章（4）
    pub async fn on_group_liked(&self, group_id: i64) -> EvaluationReport {
        self.evaluate(Trigger::GroupLiked, group_id, Utc::now()).await
    }

    /// 满周年检查（3）
    pub async fn on_tenure_check(&self, group_id: i64) -> EvaluationReport {
        self.evaluate(Trigger::TenureCheck, group_id, Utc::now()).await
    }

    /// 按配置的执行模式分发评估
    ///
    /// 异步模式下在后台任务中执行并立即返回 None
    pub async fn dispatch(
        self: &Arc<Self>,
        trigger: Trigger,
        subject_id: i64,
    ) -> Option<EvaluationReport> {
        if self.async_execution {
            let engine = Arc::clone(self);
            tokio::spawn(async move {
                let report = engine.evaluate(trigger, subject_id, Utc::now()).await;
                if !report.is_complete() {
                    warn!(trigger = %trigger, subject_id, "后台徽章评估未完整完成");
                }
            });
            None
        } else {
            Some(self.evaluate(trigger, subject_id, Utc::now()).await)
        }
    }

    // ==================== 评估流程 ====================

    /// 在指定时刻评估某事件涉及的全部徽章
    #[instrument(skip(self, trigger), fields(trigger = %trigger))]
    pub async fn evaluate(
        &self,
        trigger: Trigger,
        subject_id: i64,
        now: DateTime<Utc>,
    ) -> EvaluationReport {
        let mut report = EvaluationReport::new(trigger, subject_id);

        let results = join_all(
            trigger
                .badges()
                .iter()
                .map(|&badge| self.evaluate_badge(trigger, badge, subject_id, now)),
        )
        .await;

        let mut awarded_group = None;
        for (badge, result) in trigger.badges().iter().copied().zip(results) {
            match result {
                BadgeResult::Awarded { group_id } => {
                    report.group_id = Some(group_id);
                    report.awarded.push(badge);
                    awarded_group = Some(group_id);
                }
                BadgeResult::AlreadyHeld { group_id } => {
                    report.group_id = Some(group_id);
                    report.already_held.push(badge);
                }
                BadgeResult::NotEligible | BadgeResult::SubjectNotFound => {
                    report.not_eligible.push(badge);
                }
                BadgeResult::Skipped => report.skipped.push(badge),
            }
        }

        if let Some(group_id) = awarded_group {
            match self.sync_badge_count(trigger, group_id).await {
                Some(count) => report.badge_count = count,
                None => report.count_sync_failed = true,
            }
            info!(
                group_id,
                awarded = ?report.awarded,
                badge_count = ?report.badge_count,
                "群组获得新徽章"
            );
        }

        report
    }

    /// 评估并授予单个徽章
    async fn evaluate_badge(
        &self,
        trigger: Trigger,
        badge: BadgeKind,
        subject_id: i64,
        now: DateTime<Utc>,
    ) -> BadgeResult {
        let Some(rule) = self.rules.get(badge) else {
            warn!(badge = %badge, "未注册该徽章的规则");
            return BadgeResult::Skipped;
        };

        let started = Instant::now();
        let eligibility = retry_with_policy(
            &self.retry_policy,
            "rule_evaluate",
            |e: &BoardError| e.is_retryable(),
            || rule.evaluate(subject_id, now),
        )
        .await;

        let eligibility = match eligibility {
            Ok(eligibility) => eligibility,
            Err(e) => {
                warn!(badge = %badge, subject_id, error = %e, "规则评估失败，跳过该徽章");
                board_metrics::record_engine_failure(trigger.as_str(), "evaluate");
                return BadgeResult::Skipped;
            }
        };
        board_metrics::record_rule_evaluation(
            badge.id(),
            eligibility.as_str(),
            started.elapsed().as_secs_f64(),
        );

        let group_id = match eligibility {
            Eligibility::Eligible { group_id } => group_id,
            Eligibility::NotEligible => return BadgeResult::NotEligible,
            Eligibility::SubjectNotFound => {
                debug!(badge = %badge, subject_id, "评估主体不存在");
                return BadgeResult::SubjectNotFound;
            }
        };

        let started = Instant::now();
        let outcome = retry_with_policy(
            &self.retry_policy,
            "ledger_award",
            |e: &BoardError| e.is_retryable(),
            || self.ledger.award(group_id, badge, now),
        )
        .await;

        match outcome {
            Ok(outcome) => {
                board_metrics::record_badge_award(
                    badge.id(),
                    trigger.as_str(),
                    outcome.as_str(),
                    started.elapsed().as_secs_f64(),
                );
                match outcome {
                    AwardOutcome::Awarded => BadgeResult::Awarded { group_id },
                    AwardOutcome::AlreadyHeld => BadgeResult::AlreadyHeld { group_id },
                }
            }
            // 授予期间群组被删除，外键拒绝写入
            Err(e) if e.is_not_found() => {
                debug!(badge = %badge, group_id, "授予时群组已不存在");
                BadgeResult::SubjectNotFound
            }
            Err(e) => {
                warn!(badge = %badge, group_id, error = %e, "徽章写入失败，跳过该徽章");
                board_metrics::record_badge_award(
                    badge.id(),
                    trigger.as_str(),
                    "failed",
                    started.elapsed().as_secs_f64(),
                );
                board_metrics::record_engine_failure(trigger.as_str(), "award");
                BadgeResult::Skipped
            }
        }
    }

    /// 重算 badge_count；外层 None 表示重试耗尽
    async fn sync_badge_count(&self, trigger: Trigger, group_id: i64) -> Option<Option<i64>> {
        let synced = retry_with_policy(
            &self.retry_policy,
            "sync_badge_count",
            |e: &BoardError| e.is_retryable(),
            || self.ledger.sync_badge_count(group_id),
        )
        .await;

        match synced {
            Ok(count) => Some(count),
            Err(e) => {
                warn!(group_id, error = %e, "badge_count 同步失败");
                board_metrics::record_engine_failure(trigger.as_str(), "sync_count");
                None
            }
        }
    }
}
