//! 提交相关的线上格式

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::models::solution::Answer;

/// 学生凭据，随每次提交一起发送
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            secret: secret.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("secret", &"***")
            .finish()
    }
}

/// 提交载荷，字段必须与接口完全一致
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionPayload<'a> {
    pub email: &'a str,
    pub secret: &'a str,
    pub url: &'a str,
    pub answer: &'a Answer,
}

/// 一次提交的结果
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StepOutcome {
    pub correct: bool,
    pub next_url: Option<String>,
    pub reason: Option<String>,
}

impl StepOutcome {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            correct: false,
            next_url: None,
            reason: Some(reason.into()),
        }
    }

    /// 宽松解码提交接口返回的 JSON
    ///
    /// 只接受 JSON 对象；各字段单独解码，类型不符的字段按缺失处理，
    /// 缺失的 `correct` 视为 false，未知字段忽略
    pub fn from_json_body(body: &str) -> Option<Self> {
        let JsonValue::Object(map) = serde_json::from_str::<JsonValue>(body).ok()? else {
            return None;
        };

        let reason = match map.get("reason") {
            None | Some(JsonValue::Null) => None,
            Some(JsonValue::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        };

        Some(Self {
            correct: map.get("correct").and_then(JsonValue::as_bool).unwrap_or(false),
            next_url: map
                .get("url")
                .and_then(JsonValue::as_str)
                .filter(|u| !u.trim().is_empty())
                .map(str::to_string),
            reason,
        })
    }
}
