//! 链路驱动器 - 编排层
//!
//! ## 职责
//!
//! 在会话时间预算内逐题推进，决定每一步之后是重试、前进、跳题还是结束。
//!
//! ## 决策规则
//!
//! 1. 预算耗尽 → `TimedOut`
//! 2. 执行一步
//! 3. 失败（错误或 `correct != true`）：
//!    - 剩余时间大于安全边际时，对同一 URL 重试一次
//!    - 重试正确则照常前进或完成
//!    - 否则任一次尝试给出了 next_url 就跳到该题（以最近一次为准）
//!    - 都没有则 `Exhausted`
//! 4. 正确：有 next_url 则前进，否则 `Completed`
//!
//! 驱动器从不返回错误，返回的 `ChainReport` 只用于日志和测试

use std::time::Duration;

use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{FailureKind, StepError};
use crate::models::{Credentials, StepOutcome};
use crate::orchestrator::session::ChainSession;
use crate::workflow::{QuizStep, StepCtx};

/// 预算与重试边际
#[derive(Debug, Clone, Copy)]
pub struct ChainPolicy {
    pub budget: Duration,
    pub retry_margin: Duration,
}

impl ChainPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            budget: config.quiz_budget(),
            retry_margin: config.retry_margin(),
        }
    }
}

/// 链路终止状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainTermination {
    /// 最后一题回答正确且没有下一题
    Completed,
    /// 失败且没有可跳转的下一题
    Exhausted,
    /// 时间预算耗尽
    TimedOut,
}

impl ChainTermination {
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            ChainTermination::Completed => None,
            ChainTermination::Exhausted => Some(FailureKind::ChainExhausted),
            ChainTermination::TimedOut => Some(FailureKind::BudgetExhausted),
        }
    }
}

/// 单个会话的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainReport {
    pub termination: ChainTermination,
    /// 总尝试次数（含重试）
    pub steps_attempted: usize,
    pub solved: usize,
    pub skipped: usize,
    pub retries: usize,
    pub elapsed: Duration,
}

/// 一道题（含可能的一次重试）之后的走向
enum Transition {
    Advance(String),
    Finish,
    Skip(String),
    GiveUp,
}

pub struct ChainDriver {
    step: QuizStep,
    policy: ChainPolicy,
}

impl ChainDriver {
    pub fn new(step: QuizStep, policy: ChainPolicy) -> Self {
        Self { step, policy }
    }

    /// 从 `start_url` 开始一个新会话，预算从此刻开始计时
    pub async fn run_chain(&self, start_url: &str, credentials: &Credentials) -> ChainReport {
        let session = ChainSession::new(start_url, self.policy.budget);
        self.run(session, credentials).await
    }

    /// 驱动一个已创建的会话直到终止
    pub async fn run(&self, mut session: ChainSession, credentials: &Credentials) -> ChainReport {
        log_session_start(&session, credentials);

        let mut solved = 0;
        let mut skipped = 0;
        let mut retries = 0;

        let termination = loop {
            if session.tracker.is_expired() {
                warn!(
                    "[会话 {}] ⏰ 时间预算已耗尽，停止于: {}",
                    session.id, session.current_url
                );
                break ChainTermination::TimedOut;
            }

            let transition = match self.attempt(&mut session, credentials).await {
                Ok(outcome) if outcome.correct => on_correct(outcome),
                first => {
                    let mut next_url = next_url_of(&first);

                    if self.session_can_retry(&session) {
                        retries += 1;
                        info!(
                            "[会话 {}] 🔁 剩余 {:.1}s，重试当前题目",
                            session.id,
                            session.tracker.remaining().as_secs_f64()
                        );
                        match self.attempt(&mut session, credentials).await {
                            Ok(outcome) if outcome.correct => {
                                info!("[会话 {}] ✓ 重试成功", session.id);
                                on_correct(outcome)
                            }
                            second => {
                                next_url = next_url_of(&second).or(next_url);
                                on_failure(next_url)
                            }
                        }
                    } else {
                        info!(
                            "[会话 {}] 剩余 {:.1}s 不足以重试",
                            session.id,
                            session.tracker.remaining().as_secs_f64()
                        );
                        on_failure(next_url)
                    }
                }
            };

            match transition {
                Transition::Advance(next) => {
                    solved += 1;
                    info!("[会话 {}] ✅ 回答正确，前进到: {}", session.id, next);
                    session.current_url = next;
                }
                Transition::Finish => {
                    solved += 1;
                    info!("[会话 {}] 🎉 最后一题回答正确", session.id);
                    break ChainTermination::Completed;
                }
                Transition::Skip(next) => {
                    skipped += 1;
                    warn!("[会话 {}] ⏭️ 放弃当前题目，跳到: {}", session.id, next);
                    session.current_url = next;
                }
                Transition::GiveUp => {
                    error!(
                        "[会话 {}] ❌ 题目失败且没有下一题: {}",
                        session.id, session.current_url
                    );
                    break ChainTermination::Exhausted;
                }
            }
        };

        let report = ChainReport {
            termination,
            steps_attempted: session.step_count,
            solved,
            skipped,
            retries,
            elapsed: session.tracker.elapsed(),
        };
        log_session_summary(&session.id, &report);
        report
    }

    fn session_can_retry(&self, session: &ChainSession) -> bool {
        session.tracker.can_afford_retry(self.policy.retry_margin)
    }

    async fn attempt(
        &self,
        session: &mut ChainSession,
        credentials: &Credentials,
    ) -> Result<StepOutcome, StepError> {
        session.step_count += 1;
        let ctx = StepCtx::new(
            session.id.clone(),
            session.step_count,
            session.current_url.clone(),
            session.tracker.deadline(),
        );

        let result = self.step.execute(&ctx, credentials).await;
        match &result {
            Ok(outcome) if !outcome.correct => {
                warn!(
                    "{} ✗ 回答错误: {}",
                    ctx,
                    outcome.reason.as_deref().unwrap_or("(无原因)")
                );
            }
            Err(e) => warn!("{} ✗ 步骤失败 ({:?}): {}", ctx, e.kind(), e),
            _ => {}
        }
        result
    }
}

fn next_url_of(result: &Result<StepOutcome, StepError>) -> Option<String> {
    result.as_ref().ok().and_then(|o| o.next_url.clone())
}

fn on_correct(outcome: StepOutcome) -> Transition {
    match outcome.next_url {
        Some(next) => Transition::Advance(next),
        None => Transition::Finish,
    }
}

fn on_failure(next_url: Option<String>) -> Transition {
    match next_url {
        Some(next) => Transition::Skip(next),
        None => Transition::GiveUp,
    }
}

// ========== 日志辅助函数 ==========

fn log_session_start(session: &ChainSession, credentials: &Credentials) {
    info!("{}", "=".repeat(60));
    info!("[会话 {}] 🚀 开始处理题目链", session.id);
    info!("[会话 {}] 邮箱: {}", session.id, credentials.email);
    info!("[会话 {}] 起始题目: {}", session.id, session.current_url);
    info!(
        "[会话 {}] ⏱️ 时间预算: {}s（剩余 {:.1}s）",
        session.id,
        session.tracker.budget().as_secs(),
        session.tracker.remaining().as_secs_f64()
    );
    info!("{}", "=".repeat(60));
}

fn log_session_summary(session_id: &str, report: &ChainReport) {
    info!("\n{}", "=".repeat(60));
    info!("[会话 {}] 📊 题目链处理完成", session_id);
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    match report.termination.failure_kind() {
        Some(kind) => warn!("终止状态: {:?} ({:?})", report.termination, kind),
        None => info!("终止状态: {:?}", report.termination),
    }
    info!("✅ 答对: {}", report.solved);
    info!("⏭️ 跳过: {}", report.skipped);
    info!("🔁 重试: {}", report.retries);
    info!("📝 总尝试: {}", report.steps_attempted);
    info!("⏱️ 用时: {:.1}s", report.elapsed.as_secs_f64());
    info!("{}", "=".repeat(60));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn termination_maps_to_failure_kind() {
        assert_eq!(ChainTermination::Completed.failure_kind(), None);
        assert_eq!(
            ChainTermination::Exhausted.failure_kind(),
            Some(FailureKind::ChainExhausted)
        );
        assert_eq!(
            ChainTermination::TimedOut.failure_kind(),
            Some(FailureKind::BudgetExhausted)
        );
    }

    #[test]
    fn failed_attempts_keep_most_recent_next_url() {
        let first: Result<StepOutcome, StepError> = Ok(StepOutcome {
            correct: false,
            next_url: Some("https://h/quiz/from-first".to_string()),
            reason: None,
        });
        let second: Result<StepOutcome, StepError> = Ok(StepOutcome {
            correct: false,
            next_url: Some("https://h/quiz/from-retry".to_string()),
            reason: None,
        });
        let merged = next_url_of(&second).or(next_url_of(&first));
        assert_eq!(merged.as_deref(), Some("https://h/quiz/from-retry"));

        let errored: Result<StepOutcome, StepError> =
            Err(StepError::PayloadTooLarge { size: 2, limit: 1 });
        let merged = next_url_of(&errored).or(next_url_of(&first));
        assert_eq!(merged.as_deref(), Some("https://h/quiz/from-first"));
    }

    #[test]
    fn policy_reads_config_defaults() {
        let policy = ChainPolicy::from_config(&Config::default());
        assert_eq!(policy.budget, Duration::from_secs(170));
        assert_eq!(policy.retry_margin, Duration::from_secs(30));
    }
}
