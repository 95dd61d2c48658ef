//! LLM 输出解析 - 业务能力层
//!
//! LLM 的输出并不保证是纯 JSON，常见偏差是被 markdown 代码块包裹，
//! 或者在 JSON 前后夹带说明文字。解析分两级：
//!
//! 1. 去掉代码块标记后严格解析 JSON 对象
//! 2. 严格解析失败时，用正则直接在原始文本中找提交地址和 answer
//!
//! 第二级必须同时找到两个字段才返回结果

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, warn};

use crate::error::InterpretError;
use crate::models::{Answer, ProposedSolution};
use crate::utils::logging::truncate_text;

const FENCE: &str = "```";
const SUBMIT_URL_KEYS: [&str; 3] = ["submit_url", "submitURL", "submitUrl"];

fn url_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"https?://[^\s"'<>`\\]+"#).expect("URL 正则无效"))
}

fn answer_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""answer"\s*:\s*([^,}\n]+)"#).expect("answer 正则无效"))
}

/// 解析 LLM 的原始输出
pub fn interpret(raw: &str) -> Result<ProposedSolution, InterpretError> {
    let cleaned = strip_code_fence(raw);

    match serde_json::from_str::<JsonValue>(cleaned) {
        Ok(JsonValue::Object(map)) => {
            let solution = solution_from_map(map)?;
            debug!(
                "解析到解答 - 提交地址: {}, 答案: {}",
                solution.submit_url, solution.answer
            );
            Ok(solution)
        }
        Ok(_) | Err(_) => {
            warn!(
                "LLM 输出不是 JSON 对象，尝试正则提取: {}",
                truncate_text(raw, 200)
            );
            salvage(raw).ok_or(InterpretError::Unparseable)
        }
    }
}

/// 去掉一层 markdown 代码块标记
///
/// 开头的标记可以带语言标签（```json）；开头和结尾各最多去掉一个
pub fn strip_code_fence(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix(FENCE) {
        let tag_len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
            .unwrap_or(rest.len());
        text = &rest[tag_len..];
    }
    if let Some(rest) = text.strip_suffix(FENCE) {
        text = rest;
    }
    text.trim()
}

fn solution_from_map(mut map: Map<String, JsonValue>) -> Result<ProposedSolution, InterpretError> {
    let submit_url = SUBMIT_URL_KEYS
        .iter()
        .find_map(|key| match map.get(*key) {
            Some(JsonValue::String(url)) if !url.trim().is_empty() => Some(url.trim().to_string()),
            _ => None,
        });
    let answer = map.remove("answer").and_then(Answer::from_json);

    let (submit_url, answer) = match (submit_url, answer) {
        (Some(url), Some(answer)) => (url, answer),
        (url, answer) => {
            let mut missing = Vec::new();
            if url.is_none() {
                missing.push("submit_url");
            }
            if answer.is_none() {
                missing.push("answer");
            }
            warn!("LLM 输出缺少必填字段: {:?}", missing);
            return Err(InterpretError::MissingFields { missing });
        }
    };

    Ok(ProposedSolution {
        submit_url,
        answer,
        reasoning: string_field(&map, "reasoning"),
        data_sources: string_list(&map, &["data_sources", "dataSources"]),
        processing_steps: string_list(&map, &["processing_steps", "processingSteps"]),
        confidence: string_field(&map, "confidence"),
    })
}

fn string_field(map: &Map<String, JsonValue>, key: &str) -> Option<String> {
    map.get(key).and_then(JsonValue::as_str).map(str::to_string)
}

fn string_list(map: &Map<String, JsonValue>, keys: &[&str]) -> Vec<String> {
    keys.iter()
        .find_map(|key| map.get(*key).and_then(JsonValue::as_array))
        .map(|items| {
            items
                .iter()
                .map(|item| match item {
                    JsonValue::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// 正则兜底：两个字段都找到才算成功
fn salvage(raw: &str) -> Option<ProposedSolution> {
    let submit_url = find_submit_url(raw);
    let answer = find_answer(raw);
    match (submit_url, answer) {
        (Some(url), Some(answer)) => {
            debug!("正则提取成功 - 提交地址: {}, 答案: {}", url, answer);
            Some(ProposedSolution::bare(url, answer))
        }
        (url, answer) => {
            warn!(
                "正则提取失败 - 提交地址: {}, 答案: {}",
                url.is_some(),
                answer.is_some()
            );
            None
        }
    }
}

/// 找第一个以 `/submit` 作为路径段或结尾的 URL
fn find_submit_url(raw: &str) -> Option<String> {
    url_pattern()
        .find_iter(raw)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ';', ':', ')', ']', '}']))
        .find(|url| has_submit_segment(url))
        .map(str::to_string)
}

fn has_submit_segment(url: &str) -> bool {
    url.match_indices("/submit").any(|(idx, needle)| {
        matches!(
            url[idx + needle.len()..].chars().next(),
            None | Some('/') | Some('?') | Some('#')
        )
    })
}

fn find_answer(raw: &str) -> Option<Answer> {
    let captured = answer_pattern().captures(raw)?.get(1)?.as_str();
    let literal = captured.trim().trim_matches('"');
    Answer::from_literal(literal)
}
