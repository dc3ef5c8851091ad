//! 后台 Worker

mod tenure_sweep;

pub use tenure_sweep::{SweepSummary, TenureSweepWorker};
