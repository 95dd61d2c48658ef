//! 测试用的脚本化外部能力
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};

use quiz_chain_solver::infrastructure::{
    Completer, PageFetcher, QuizPrompt, SubmissionResponse, Submitter,
};
use quiz_chain_solver::{
    Capabilities, ChainDriver, ChainPolicy, Credentials, QuizStep, StepLimits, TransportError,
};

pub fn credentials() -> Credentials {
    Credentials::new("student@example.com", "s3cret")
}

pub fn quiz(n: &str) -> String {
    format!("https://quiz.test/quiz/{n}")
}

pub const SUBMIT_URL: &str = "https://quiz.test/submit";

/// LLM 的标准 JSON 回复
pub fn llm_reply(answer: JsonValue) -> String {
    json!({
        "submit_url": SUBMIT_URL,
        "answer": answer,
        "reasoning": "scripted",
    })
    .to_string()
}

/// 提交接口的判分响应
pub fn graded(correct: bool, next: Option<&str>) -> SubmissionResponse {
    let mut body = json!({ "correct": correct });
    if let Some(next) = next {
        body["url"] = json!(next);
    }
    if !correct {
        body["reason"] = json!("wrong answer");
    }
    SubmissionResponse {
        status: 200,
        body: body.to_string(),
    }
}

/// 按 key 排队的脚本，最后一条会重复使用
struct Script<T> {
    queues: HashMap<String, VecDeque<T>>,
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            queues: HashMap::new(),
        }
    }
}

impl<T: Clone> Script<T> {
    fn push(&mut self, key: &str, item: T) {
        self.queues.entry(key.to_string()).or_default().push_back(item);
    }

    fn next(&mut self, key: &str) -> Option<T> {
        let queue = self.queues.get_mut(key)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

// ========== PageFetcher ==========

#[derive(Default)]
pub struct FakeFetcher {
    pages: Mutex<HashMap<String, (String, Duration)>>,
    fetched: Mutex<Vec<String>>,
    shutdowns: AtomicUsize,
}

impl FakeFetcher {
    pub fn page(self, url: &str, text: &str) -> Self {
        self.slow_page(url, text, Duration::ZERO)
    }

    pub fn slow_page(self, url: &str, text: &str, delay: Duration) -> Self {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), (text.to_string(), delay));
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<String, TransportError> {
        self.fetched.lock().unwrap().push(url.to_string());
        let page = self.pages.lock().unwrap().get(url).cloned();
        match page {
            Some((text, delay)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(text)
            }
            None => Err(TransportError::Network(format!("no page at {url}"))),
        }
    }

    async fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

// ========== Completer ==========

/// 按提示词中的题目 URL 返回脚本化回复
#[derive(Default)]
pub struct FakeCompleter {
    replies: Mutex<Script<String>>,
    calls: AtomicUsize,
}

impl FakeCompleter {
    pub fn reply(self, quiz_url: &str, raw: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push(quiz_url, raw.into());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn quiz_url_of(prompt: &QuizPrompt) -> String {
    prompt
        .user
        .lines()
        .find_map(|line| line.strip_prefix("QUIZ URL: "))
        .unwrap_or_default()
        .trim()
        .to_string()
}

#[async_trait]
impl Completer for FakeCompleter {
    async fn complete(&self, prompt: &QuizPrompt) -> Result<String, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let url = quiz_url_of(prompt);
        self.replies
            .lock()
            .unwrap()
            .next(&url)
            .ok_or_else(|| TransportError::InvalidResponse(format!("no reply for {url}")))
    }
}

// ========== Submitter ==========

/// 按载荷中的题目 URL 返回脚本化判分
#[derive(Default)]
pub struct FakeSubmitter {
    responses: Mutex<Script<SubmissionResponse>>,
    submitted: Mutex<Vec<(String, JsonValue)>>,
}

impl FakeSubmitter {
    pub fn respond(self, quiz_url: &str, response: SubmissionResponse) -> Self {
        self.responses.lock().unwrap().push(quiz_url, response);
        self
    }

    /// (提交地址, 载荷) 列表
    pub fn submitted(&self) -> Vec<(String, JsonValue)> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn submissions_for(&self, quiz_url: &str) -> usize {
        self.submitted()
            .iter()
            .filter(|(_, body)| body["url"] == quiz_url)
            .count()
    }
}

#[async_trait]
impl Submitter for FakeSubmitter {
    async fn submit(&self, url: &str, body: Vec<u8>) -> Result<SubmissionResponse, TransportError> {
        let payload: JsonValue = serde_json::from_slice(&body)
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;
        let quiz_url = payload["url"].as_str().unwrap_or_default().to_string();
        self.submitted
            .lock()
            .unwrap()
            .push((url.to_string(), payload));
        self.responses
            .lock()
            .unwrap()
            .next(&quiz_url)
            .ok_or_else(|| TransportError::Network(format!("no response for {quiz_url}")))
    }
}

// ========== 组装 ==========

pub struct Fakes {
    pub fetcher: Arc<FakeFetcher>,
    pub completer: Arc<FakeCompleter>,
    pub submitter: Arc<FakeSubmitter>,
}

impl Fakes {
    pub fn new(fetcher: FakeFetcher, completer: FakeCompleter, submitter: FakeSubmitter) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            completer: Arc::new(completer),
            submitter: Arc::new(submitter),
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            fetcher: self.fetcher.clone(),
            completer: self.completer.clone(),
            submitter: self.submitter.clone(),
        }
    }

    pub fn step(&self) -> QuizStep {
        self.step_with(StepLimits::default())
    }

    pub fn step_with(&self, limits: StepLimits) -> QuizStep {
        QuizStep::new(self.capabilities(), limits)
    }

    pub fn driver(&self, budget_secs: u64, margin_secs: u64) -> ChainDriver {
        ChainDriver::new(self.step(), policy(budget_secs, margin_secs))
    }
}

pub fn policy(budget_secs: u64, margin_secs: u64) -> ChainPolicy {
    ChainPolicy {
        budget: Duration::from_secs(budget_secs),
        retry_margin: Duration::from_secs(margin_secs),
    }
}
