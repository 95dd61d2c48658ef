//! 基础设施层（Infrastructure）
//!
//! 定义链路所需的三种外部能力，以及它们的具体实现：
//!
//! - `PageFetcher` - 渲染 URL 并返回可见文本（`BrowserPageFetcher`）
//! - `Completer` - 把提示词交给 LLM 并返回原始文本（`services::LlmService`）
//! - `Submitter` - 向提交地址 POST JSON 并返回状态码与 body（`HttpSubmitter`）
//!
//! 每种能力都返回显式的 `TransportError`，由步骤执行器统一转换

pub mod http_submitter;
pub mod js_executor;
pub mod page_fetcher;

use async_trait::async_trait;

use crate::error::TransportError;

pub use http_submitter::HttpSubmitter;
pub use js_executor::JsExecutor;
pub use page_fetcher::BrowserPageFetcher;

/// 发送给 LLM 的提示词
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizPrompt {
    pub system: String,
    pub user: String,
}

/// 提交接口的原始响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResponse {
    pub status: u16,
    pub body: String,
}

impl SubmissionResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 页面抓取能力
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// 渲染页面并返回可见文本
    async fn fetch(&self, url: &str) -> Result<String, TransportError>;

    /// 释放持有的资源，会话结束时调用
    async fn shutdown(&self) {}
}

/// LLM 补全能力
#[async_trait]
pub trait Completer: Send + Sync {
    async fn complete(&self, prompt: &QuizPrompt) -> Result<String, TransportError>;
}

/// 答案提交能力
#[async_trait]
pub trait Submitter: Send + Sync {
    /// `body` 为已经序列化好的 JSON
    async fn submit(&self, url: &str, body: Vec<u8>) -> Result<SubmissionResponse, TransportError>;
}
