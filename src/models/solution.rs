//! LLM 解答模型

use serde::Serialize;
use serde_json::{Number, Value as JsonValue};

/// 答案
///
/// 题目要求的答案类型不固定，解码时按 布尔 → 数字 → 字符串/结构化值 的顺序确定
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Answer {
    Bool(bool),
    Number(Number),
    Text(String),
    Structured(JsonValue),
}

impl Answer {
    /// 从 JSON 值构造答案，`null` 不算答案
    pub fn from_json(value: JsonValue) -> Option<Self> {
        match value {
            JsonValue::Null => None,
            JsonValue::Bool(b) => Some(Answer::Bool(b)),
            JsonValue::Number(n) => Some(Answer::Number(n)),
            JsonValue::String(s) => Some(Answer::Text(s)),
            other => Some(Answer::Structured(other)),
        }
    }

    /// 从一段字面量文本构造答案
    ///
    /// 先尝试严格 JSON 解析以保留数字 / 布尔类型，失败时原样作为字符串
    pub fn from_literal(literal: &str) -> Option<Self> {
        let literal = literal.trim();
        if literal.is_empty() {
            return None;
        }
        match serde_json::from_str::<JsonValue>(literal) {
            Ok(value) => Self::from_json(value),
            Err(_) => Some(Answer::Text(literal.to_string())),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Answer::Bool(b) => JsonValue::Bool(*b),
            Answer::Number(n) => JsonValue::Number(n.clone()),
            Answer::Text(s) => JsonValue::String(s.clone()),
            Answer::Structured(v) => v.clone(),
        }
    }
}

impl std::fmt::Display for Answer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Answer::Bool(b) => write!(f, "{}", b),
            Answer::Number(n) => write!(f, "{}", n),
            Answer::Text(s) => write!(f, "\"{}\"", s),
            Answer::Structured(v) => write!(f, "{}", v),
        }
    }
}

/// LLM 给出的解答
///
/// `submit_url` 与 `answer` 必填；其余字段只用于诊断日志
#[derive(Debug, Clone, PartialEq)]
pub struct ProposedSolution {
    pub submit_url: String,
    pub answer: Answer,
    pub reasoning: Option<String>,
    pub data_sources: Vec<String>,
    pub processing_steps: Vec<String>,
    pub confidence: Option<String>,
}

impl ProposedSolution {
    /// 只含必填字段的解答（正则兜底时使用）
    pub fn bare(submit_url: impl Into<String>, answer: Answer) -> Self {
        Self {
            submit_url: submit_url.into(),
            answer,
            reasoning: None,
            data_sources: Vec::new(),
            processing_steps: Vec::new(),
            confidence: None,
        }
    }
}
