//! 单题处理流程 - 流程层
//!
//! 核心职责：定义"一道题"的完整处理流程
//!
//! 流程顺序：
//! 1. 抓取页面文本
//! 2. 构建提示词 → LLM
//! 3. 解析 LLM 输出
//! 4. 编码载荷（超限则本地失败）→ 提交
//!
//! 任何一环失败都转换为 `StepError` 返回，后续环节不再执行

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{StepError, TransportError};
use crate::infrastructure::{Completer, PageFetcher, Submitter};
use crate::models::{Credentials, StepOutcome};
use crate::services::{interpret, SubmissionService};
use crate::utils::logging::truncate_text;
use crate::workflow::prompt::build_quiz_prompt;
use crate::workflow::step_ctx::StepCtx;

/// 单个会话持有的外部能力
#[derive(Clone)]
pub struct Capabilities {
    pub fetcher: Arc<dyn PageFetcher>,
    pub completer: Arc<dyn Completer>,
    pub submitter: Arc<dyn Submitter>,
}

/// 每次外部调用的超时与载荷上限
#[derive(Debug, Clone)]
pub struct StepLimits {
    pub fetch_timeout: Duration,
    pub completion_timeout: Duration,
    pub submit_timeout: Duration,
    pub max_payload_bytes: usize,
}

impl StepLimits {
    pub fn from_config(config: &Config) -> Self {
        Self {
            fetch_timeout: config.fetch_timeout(),
            completion_timeout: config.llm_timeout(),
            submit_timeout: config.http_timeout(),
            max_payload_bytes: config.max_payload_bytes,
        }
    }
}

impl Default for StepLimits {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// 单题处理流程
///
/// - 每步恰好一次抓取、一次 LLM 调用、至多一次提交
/// - 不决定重试或跳题，由驱动器负责
pub struct QuizStep {
    capabilities: Capabilities,
    submission: SubmissionService,
    limits: StepLimits,
}

impl QuizStep {
    pub fn new(capabilities: Capabilities, limits: StepLimits) -> Self {
        Self {
            capabilities,
            submission: SubmissionService::new(limits.max_payload_bytes),
            limits,
        }
    }

    pub async fn execute(
        &self,
        ctx: &StepCtx,
        credentials: &Credentials,
    ) -> Result<StepOutcome, StepError> {
        // ========== 1. 抓取页面 ==========
        info!("{} 🌐 正在抓取题目页面: {}", ctx, ctx.url);
        let page_text = within(
            ctx.deadline,
            self.limits.fetch_timeout,
            self.capabilities.fetcher.fetch(&ctx.url),
        )
        .await
        .map_err(|e| {
            warn!("{} ⚠️ 抓取失败: {}", ctx, e);
            StepError::FetchFailed(e)
        })?;
        info!("{} 题目内容: {}", ctx, truncate_text(&page_text, 200));

        // ========== 2. LLM 解题 ==========
        let prompt = build_quiz_prompt(&page_text, &ctx.url);
        info!("{} 🤖 正在调用 LLM 分析题目...", ctx);
        let raw = within(
            ctx.deadline,
            self.limits.completion_timeout,
            self.capabilities.completer.complete(&prompt),
        )
        .await
        .map_err(|e| {
            warn!("{} ⚠️ LLM 调用失败: {}", ctx, e);
            StepError::CompletionFailed(e)
        })?;
        debug!("{} LLM 响应: {}", ctx, truncate_text(&raw, 500));

        // ========== 3. 解析解答 ==========
        let solution = interpret(&raw).map_err(|e| {
            warn!("{} ⚠️ {}", ctx, e);
            StepError::from(e)
        })?;
        info!(
            "{} ✓ 提交地址: {}, 答案: {}",
            ctx,
            solution.submit_url,
            truncate_text(&solution.answer.to_string(), 200)
        );
        if let Some(reasoning) = &solution.reasoning {
            debug!("{} 解题思路: {}", ctx, truncate_text(reasoning, 300));
        }

        // ========== 4. 提交 ==========
        let body = self
            .submission
            .encode_payload(credentials, &ctx.url, &solution.answer)?;

        info!("{} 📤 正在提交答案到: {}", ctx, solution.submit_url);
        let response = within(
            ctx.deadline,
            self.limits.submit_timeout,
            self.capabilities.submitter.submit(&solution.submit_url, body),
        )
        .await
        .map_err(|e| {
            warn!("{} ⚠️ 提交失败: {}", ctx, e);
            StepError::SubmissionFailed(e)
        })?;

        let outcome = self.submission.decode_response(&response);
        info!(
            "{} 提交结果: correct={}, next={:?}, reason={:?}",
            ctx, outcome.correct, outcome.next_url, outcome.reason
        );
        Ok(outcome)
    }
}

/// 截止时间前预留的余量，保证单次调用窗口严格小于剩余预算
const DEADLINE_GUARD: Duration = Duration::from_millis(50);

/// 在 `min(单次超时, 剩余预算 - 余量)` 内执行一次外部调用
async fn within<T>(
    deadline: Instant,
    limit: Duration,
    call: impl Future<Output = Result<T, TransportError>>,
) -> Result<T, TransportError> {
    let remaining = deadline.saturating_duration_since(Instant::now());
    let window = limit.min(remaining.saturating_sub(DEADLINE_GUARD));
    tokio::time::timeout(window, call)
        .await
        .map_err(|_| TransportError::Timeout(window))?
}
