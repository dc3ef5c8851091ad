//! 满周年徽章扫描 Worker
//!
//! 满周年没有对应的请求事件，由该 Worker 定期扫描：
//! 找出创建已满 N 个月且尚未持有徽章 3 的群组，逐个交给引擎评估。

use std::sync::Arc;
use std::time::Duration;

use board_shared::config::WorkerConfig;
use board_shared::observability::metrics;
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::engine::{BadgeEngine, Trigger};
use crate::error::{BoardError, Result};
use crate::models::BadgeKind;
use crate::repository::GroupRepositoryTrait;
use crate::rules::GroupAgeRule;

const WORKER_NAME: &str = "tenure_sweep";

/// 单轮扫描汇总
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub scanned: usize,
    pub awarded: usize,
    pub skipped: usize,
}

/// 满周年徽章扫描 Worker
pub struct TenureSweepWorker {
    group_repo: Arc<dyn GroupRepositoryTrait>,
    engine: Arc<BadgeEngine>,
    poll_interval: Duration,
    batch_size: i64,
    age_months: u32,
}

impl TenureSweepWorker {
    pub fn new(
        group_repo: Arc<dyn GroupRepositoryTrait>,
        engine: Arc<BadgeEngine>,
        config: &WorkerConfig,
        age_months: u32,
    ) -> Self {
        Self {
            group_repo,
            engine,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            batch_size: config.batch_size.max(1),
            age_months,
        }
    }

    /// 主循环：持续扫描直到收到关闭信号
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            poll_interval = ?self.poll_interval,
            batch_size = self.batch_size,
            age_months = self.age_months,
            "TenureSweepWorker 已启动"
        );

        loop {
            match self.sweep_once(Utc::now()).await {
                Ok(summary) if summary.scanned > 0 => {
                    info!(
                        scanned = summary.scanned,
                        awarded = summary.awarded,
                        skipped = summary.skipped,
                        "满周年扫描完成"
                    );
                }
                Ok(_) => debug!("没有待处理的满周年群组"),
                Err(e) => error!(error = %e, "满周年扫描出错"),
            }

            metrics::set_worker_last_run(WORKER_NAME);

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = shutdown.changed() => {
                    info!("TenureSweepWorker 收到关闭信号");
                    return;
                }
            }
        }
    }

    /// 执行一轮扫描
    ///
    /// 批次写满且有新授予时继续取下一批；
    /// 授予失败的群组仍是候选，留到下一轮处理，避免本轮空转
    pub async fn sweep_once(&self, now: DateTime<Utc>) -> Result<SweepSummary> {
        let cutoff = GroupAgeRule::cutoff(self.age_months, now)
            .ok_or_else(|| BoardError::Internal("满周年截止时间溢出".to_string()))?;
        let mut summary = SweepSummary::default();

        loop {
            let candidates = self
                .group_repo
                .list_tenure_candidates(cutoff, BadgeKind::GroupAge.id(), self.batch_size)
                .await?;
            let batch_len = candidates.len();
            let mut batch_awarded = 0;

            for group_id in candidates {
                let report = self.engine.evaluate(Trigger::TenureCheck, group_id, now).await;
                summary.scanned += 1;
                if report.has_new_awards() {
                    batch_awarded += 1;
                } else if !report.is_complete() {
                    summary.skipped += 1;
                }
            }
            summary.awarded += batch_awarded;

            if (batch_len as i64) < self.batch_size || batch_awarded == 0 {
                return Ok(summary);
            }
        }
    }
}
