//! 看板徽章 Worker
//!
//! 连接数据库、校验表结构，然后运行满周年徽章扫描直到收到关闭信号。

use std::sync::Arc;

use anyhow::Result;
use board_shared::{config::AppConfig, database::Database, observability};
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

use board::{
    AwardLedger, BadgeEngine, GroupBadgeRepository, GroupRepository, PostRepository, RuleSet,
    TenureSweepWorker, schema,
};

const SERVICE_NAME: &str = "board-badge-worker";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // 1. 加载配置
    let config = AppConfig::load(SERVICE_NAME).unwrap_or_else(|e| {
        eprintln!("配置加载失败，使用默认配置: {e}");
        AppConfig::default()
    });

    // 2. 初始化可观测性
    let _guard = observability::init(&config.observability).await?;
    info!(environment = %config.environment, "Starting {}...", SERVICE_NAME);

    // 3. 连接数据库并校验表结构
    let db = Database::connect(&config.database).await?;
    db.health_check().await?;
    db.verify_tables(schema::table_names()).await?;
    let pool = db.pool().clone();
    info!("Database connection established");

    // 4. 组装仓储与引擎
    let group_repo = Arc::new(GroupRepository::new(pool.clone()));
    let post_repo = Arc::new(PostRepository::new(pool.clone()));
    let group_badge_repo = Arc::new(GroupBadgeRepository::new(pool.clone()));

    let rules = RuleSet::from_config(&config.badge, group_repo.clone(), post_repo);
    let engine = Arc::new(BadgeEngine::new(
        rules,
        AwardLedger::new(group_badge_repo),
        &config.badge,
    ));

    // 5. 运行 Worker
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker_handle = if config.worker.tenure_sweep_enabled {
        let worker = TenureSweepWorker::new(
            group_repo,
            engine,
            &config.worker,
            config.badge.group_age_months,
        );
        Some(tokio::spawn(async move { worker.run(shutdown_rx).await }))
    } else {
        warn!("满周年扫描已禁用");
        None
    };

    shutdown_signal().await;
    let _ = shutdown_tx.send(true);

    if let Some(handle) = worker_handle {
        if let Err(e) = handle.await {
            error!(error = %e, "Worker 任务异常退出");
        }
    }

    db.close().await;
    info!("Service shutdown complete");
    Ok(())
}

/// 优雅关闭信号处理
///
/// 监听 Ctrl+C 和 SIGTERM 信号
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        }
    }
}
