//! 会话时间预算
//!
//! 预算从请求被接受的时刻开始计算，只会单调减少

use std::time::Duration;

use tokio::time::Instant;

/// 剩余预算 = budget - (now - start)，最小为 0
pub fn remaining(start: Instant, budget: Duration, now: Instant) -> Duration {
    budget.saturating_sub(now.saturating_duration_since(start))
}

#[derive(Debug, Clone, Copy)]
pub struct BudgetTracker {
    start: Instant,
    budget: Duration,
}

impl BudgetTracker {
    pub fn new(budget: Duration) -> Self {
        Self::starting_at(Instant::now(), budget)
    }

    pub fn starting_at(start: Instant, budget: Duration) -> Self {
        Self { start, budget }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn elapsed(&self) -> Duration {
        Instant::now().saturating_duration_since(self.start)
    }

    pub fn remaining(&self) -> Duration {
        self.remaining_at(Instant::now())
    }

    pub fn remaining_at(&self, now: Instant) -> Duration {
        remaining(self.start, self.budget, now)
    }

    pub fn is_expired(&self) -> bool {
        self.remaining().is_zero()
    }

    /// 剩余时间严格大于安全边际时才允许重试
    pub fn can_afford_retry(&self, margin: Duration) -> bool {
        self.remaining() > margin
    }

    /// 任何外部调用都不能越过的时刻
    pub fn deadline(&self) -> Instant {
        self.start + self.budget
    }
}
