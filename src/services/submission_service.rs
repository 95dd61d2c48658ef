//! 提交服务 - 业务能力层
//!
//! 只负责载荷编码与响应解码，网络调用由 `Submitter` 完成

use tracing::{debug, warn};

use crate::error::{StepError, TransportError};
use crate::infrastructure::SubmissionResponse;
use crate::models::{Answer, Credentials, StepOutcome, SubmissionPayload};
use crate::utils::logging::truncate_text;

pub const UNPARSEABLE_RESPONSE: &str = "unparseable submission response";

/// 提交服务
#[derive(Debug, Clone)]
pub struct SubmissionService {
    max_payload_bytes: usize,
}

impl SubmissionService {
    pub fn new(max_payload_bytes: usize) -> Self {
        Self { max_payload_bytes }
    }

    /// 编码提交载荷
    ///
    /// 超过大小上限时返回 `PayloadTooLarge`，调用方不得发起网络请求
    pub fn encode_payload(
        &self,
        credentials: &Credentials,
        quiz_url: &str,
        answer: &Answer,
    ) -> Result<Vec<u8>, StepError> {
        let payload = SubmissionPayload {
            email: &credentials.email,
            secret: &credentials.secret,
            url: quiz_url,
            answer,
        };
        let body = serde_json::to_vec(&payload).map_err(|e| {
            StepError::SubmissionFailed(TransportError::InvalidResponse(format!(
                "载荷序列化失败: {}",
                e
            )))
        })?;

        if body.len() > self.max_payload_bytes {
            warn!(
                "提交载荷过大: {} 字节 (上限 {} 字节)",
                body.len(),
                self.max_payload_bytes
            );
            return Err(StepError::PayloadTooLarge {
                size: body.len(),
                limit: self.max_payload_bytes,
            });
        }

        debug!("载荷: {}", redacted_preview(&body, &credentials.secret));
        Ok(body)
    }

    /// 把提交接口的响应归一化为 `StepOutcome`
    pub fn decode_response(&self, response: &SubmissionResponse) -> StepOutcome {
        if response.is_success() {
            return StepOutcome::from_json_body(&response.body)
                .unwrap_or_else(|| StepOutcome::rejected(UNPARSEABLE_RESPONSE));
        }

        warn!(
            "提交失败: {} - {}",
            response.status,
            truncate_text(&response.body, 200)
        );
        StepOutcome::from_json_body(&response.body).unwrap_or_else(|| {
            StepOutcome::rejected(format!("HTTP {}: {}", response.status, response.body))
        })
    }
}

/// 日志预览，隐藏 secret
fn redacted_preview(body: &[u8], secret: &str) -> String {
    let text = String::from_utf8_lossy(body);
    let text = if secret.is_empty() {
        text.into_owned()
    } else {
        text.replace(secret, "***")
    };
    truncate_text(&text, 500)
}
