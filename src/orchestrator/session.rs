//! 会话状态
//!
//! 一个会话对应一次被接受的请求，只由链路驱动器持有和修改

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::orchestrator::budget::BudgetTracker;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// 生成进程内唯一的会话ID（S0001, S0002, ...）
pub fn next_session_id() -> String {
    format!("S{:04}", NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
}

#[derive(Debug)]
pub struct ChainSession {
    pub id: String,
    pub tracker: BudgetTracker,
    /// 已执行的尝试次数（含重试）
    pub step_count: usize,
    pub current_url: String,
}

impl ChainSession {
    pub fn new(start_url: impl Into<String>, budget: Duration) -> Self {
        Self::with_tracker(start_url, BudgetTracker::new(budget))
    }

    /// 使用已经开始计时的预算（请求被接受时即开始计时）
    pub fn with_tracker(start_url: impl Into<String>, tracker: BudgetTracker) -> Self {
        Self {
            id: next_session_id(),
            tracker,
            step_count: 0,
            current_url: start_url.into(),
        }
    }
}
