//! LLM 服务 - 业务能力层
//!
//! 只负责"把提示词交给 LLM 并拿回原始文本"，不关心解析与流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型，兼容 OpenAI API 的服务均可使用

use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::TransportError;
use crate::infrastructure::{Completer, QuizPrompt};

/// 保持输出稳定，便于解析
const TEMPERATURE: f32 = 0.1;
const MAX_TOKENS: u32 = 4000;

/// LLM 服务
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
    timeout: Duration,
}

impl LlmService {
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
            timeout: config.llm_timeout(),
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（已去除首尾空白）
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> Result<String, TransportError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()
                .map_err(invalid_request)?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(invalid_request)?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(TEMPERATURE)
            .max_tokens(MAX_TOKENS)
            .build()
            .map_err(invalid_request)?;

        let response = tokio::time::timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| TransportError::Timeout(self.timeout))?
            .map_err(|e| {
                warn!("LLM API 调用失败: {}", e);
                TransportError::Network(format!("LLM API 调用失败: {}", e))
            })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| TransportError::InvalidResponse("LLM 返回内容为空".to_string()))?;

        Ok(content.trim().to_string())
    }
}

fn invalid_request(e: impl std::fmt::Display) -> TransportError {
    TransportError::InvalidResponse(format!("构建 LLM 请求失败: {}", e))
}

#[async_trait]
impl Completer for LlmService {
    async fn complete(&self, prompt: &QuizPrompt) -> Result<String, TransportError> {
        self.send_to_llm(&prompt.user, Some(&prompt.system)).await
    }
}
